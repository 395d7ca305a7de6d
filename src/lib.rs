//! card_fraud - credit-card fraud detection workflow
//!
//! Loads labelled transactions from CSV, splits them into train/test sets,
//! assembles and normalizes the feature columns, trains a boosted-tree or
//! linear classifier, cross-validates it and persists the best fold model.
//!
//! # Modules
//!
//! - [`data`] - schema, rows, CSV loading, split persistence
//! - [`preprocessing`] - feature assembly and normalization
//! - [`training`] - trainers, splitter, fitted model
//! - [`evaluation`] - metrics, holdout evaluation, cross-validation
//! - [`export`] - checksummed model artifacts
//! - [`report`] - console formatting
//! - [`pipeline`] - the train/predict/inspect workflows
//! - [`cli`] - command-line interface

pub mod error;

pub mod data;
pub mod preprocessing;
pub mod training;
pub mod evaluation;
pub mod export;

pub mod config;
pub mod pipeline;
pub mod report;

pub mod cli;
pub mod utils;

pub use error::{FraudError, Result};

/// Common imports
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::data::{DataLoader, Dataset, Row, Schema, SplitCache};
    pub use crate::error::{FraudError, Result};
    pub use crate::evaluation::{cross_validate, evaluate, BinaryMetrics};
    pub use crate::export::ModelStore;
    pub use crate::preprocessing::{FeatureAssembler, NormalizationMode, Normalizer};
    pub use crate::report::ConsoleReporter;
    pub use crate::training::{FraudModel, Prediction, Splitter, TrainEngine, Trainer, TrainerConfig};
}
