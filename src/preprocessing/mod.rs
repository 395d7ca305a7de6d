//! Feature preprocessing
//!
//! Assembles the numeric transaction columns into a single feature vector and
//! normalizes it with statistics fitted on training data.

mod assembler;
mod normalizer;

pub use assembler::{FeatureAssembler, FeatureVector};
pub use normalizer::{ColumnParams, NormalizationMode, Normalizer};
