//! Model training
//!
//! Two trainers sit behind the [`Trainer`] trait:
//! - `fast_tree`: gradient-boosted regression trees (leaf-wise growth)
//! - `logistic`: L2-regularized linear logistic classifier
//!
//! [`TrainEngine`] wraps a trainer with feature assembly and normalization and
//! produces a [`FraudModel`].

mod engine;
mod models;
pub mod boosted_trees;
pub mod cross_validation;
pub mod linear;
pub mod regression_tree;

pub use boosted_trees::{BoostedTreesConfig, BoostedTreesModel, BoostedTreesTrainer};
pub use cross_validation::{CVResults, CVSplit, Fold, Splitter};
pub use engine::TrainEngine;
pub use linear::{LinearConfig, LinearModel, LinearTrainer};
pub use models::{FraudModel, Prediction};
pub use regression_tree::{RegressionTree, TreeNode, TreeParams};

use crate::error::{FraudError, Result};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fits a classifier on normalized features
pub trait Trainer: Send + Sync {
    fn name(&self) -> &'static str;

    fn fit(&self, x: &Array2<f64>, labels: &[bool]) -> Result<Classifier>;
}

/// Fitted binary classifier producing a raw margin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Classifier {
    BoostedTrees(BoostedTreesModel),
    Linear(LinearModel),
}

impl Classifier {
    pub fn score(&self, features: ArrayView1<f64>) -> f64 {
        match self {
            Classifier::BoostedTrees(m) => m.score(features),
            Classifier::Linear(m) => m.score(features),
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Classifier::BoostedTrees(m) => m.n_features(),
            Classifier::Linear(m) => m.n_features(),
        }
    }
}

/// Trainer selection with its hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainerConfig {
    FastTree(BoostedTreesConfig),
    /// Gradient-descent logistic regression. `sdca` is accepted as an alias.
    #[serde(alias = "sdca")]
    Logistic(LinearConfig),
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig::FastTree(BoostedTreesConfig::default())
    }
}

impl TrainerConfig {
    pub fn name(&self) -> &'static str {
        match self {
            TrainerConfig::FastTree(_) => "fast_tree",
            TrainerConfig::Logistic(_) => "logistic",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            TrainerConfig::FastTree(c) => c.validate(),
            TrainerConfig::Logistic(c) => c.validate(),
        }
    }

    pub fn build(&self) -> Arc<dyn Trainer> {
        match self {
            TrainerConfig::FastTree(c) => Arc::new(BoostedTreesTrainer::new(c.clone())),
            TrainerConfig::Logistic(c) => Arc::new(LinearTrainer::new(c.clone())),
        }
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub(crate) fn check_training_input(x: &Array2<f64>, labels: &[bool]) -> Result<()> {
    if x.nrows() == 0 {
        return Err(FraudError::TrainingError("empty training set".to_string()));
    }
    if x.nrows() != labels.len() {
        return Err(FraudError::ValidationError(format!(
            "{} feature rows but {} labels",
            x.nrows(),
            labels.len()
        )));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(FraudError::TrainingError("non-finite feature value".to_string()));
    }
    Ok(())
}
