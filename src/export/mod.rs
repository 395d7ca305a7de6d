//! Model persistence

mod model_store;

pub use model_store::{load, load_for_features, save, ModelStore, FORMAT_VERSION};
