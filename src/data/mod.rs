//! Transaction data: schema, records, loading and split persistence

pub mod archive;
pub mod loader;
pub mod row;
pub mod schema;
pub mod split_cache;

pub use archive::{ensure_source, extract_entry};
pub use loader::{parse_bool, DataLoader};
pub use row::{Dataset, Row, FEATURE_COUNT, FEATURE_NAMES};
pub use schema::{Binding, ColumnDef, ColumnKind, RowField, Schema};
pub use split_cache::{SplitCache, SplitData, TEST_FILE, TRAIN_FILE};
