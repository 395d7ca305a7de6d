//! Gradient-boosted regression trees on the logistic loss

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::regression_tree::{RegressionTree, TreeParams};
use super::{check_training_input, sigmoid, Classifier, Trainer};
use crate::error::{FraudError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostedTreesConfig {
    pub num_trees: usize,
    pub num_leaves: usize,
    pub min_docs_per_leaf: usize,
    pub learning_rate: f64,
    pub l2_regularization: f64,
}

impl Default for BoostedTreesConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            num_leaves: 20,
            min_docs_per_leaf: 10,
            learning_rate: 0.2,
            l2_regularization: 1.0,
        }
    }
}

impl BoostedTreesConfig {
    pub fn with_num_trees(mut self, n: usize) -> Self {
        self.num_trees = n;
        self
    }

    pub fn with_num_leaves(mut self, n: usize) -> Self {
        self.num_leaves = n;
        self
    }

    pub fn with_min_docs_per_leaf(mut self, n: usize) -> Self {
        self.min_docs_per_leaf = n;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_trees == 0 {
            return Err(FraudError::ConfigError("num_trees must be positive".into()));
        }
        if self.num_leaves < 2 {
            return Err(FraudError::ConfigError("num_leaves must be at least 2".into()));
        }
        if self.min_docs_per_leaf == 0 {
            return Err(FraudError::ConfigError("min_docs_per_leaf must be positive".into()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(FraudError::ConfigError(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.l2_regularization >= 0.0 && self.l2_regularization.is_finite()) {
            return Err(FraudError::ConfigError("l2_regularization must be non-negative".into()));
        }
        Ok(())
    }
}

/// Boosted ensemble: `score = initial_score + learning_rate * sum(tree(x))`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedTreesModel {
    initial_score: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl BoostedTreesModel {
    pub fn score(&self, features: ArrayView1<f64>) -> f64 {
        self.initial_score
            + self.learning_rate * self.trees.iter().map(|t| t.predict(features)).sum::<f64>()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn initial_score(&self) -> f64 {
        self.initial_score
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoostedTreesTrainer {
    config: BoostedTreesConfig,
}

impl BoostedTreesTrainer {
    pub fn new(config: BoostedTreesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BoostedTreesConfig {
        &self.config
    }

    pub fn fit_model(&self, x: &Array2<f64>, labels: &[bool]) -> Result<BoostedTreesModel> {
        self.config.validate()?;
        check_training_input(x, labels)?;

        let n = x.nrows();
        let y: Vec<f64> = labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();

        // log-odds of the training prior
        let prior = (y.iter().sum::<f64>() / n as f64).clamp(1e-6, 1.0 - 1e-6);
        let initial_score = (prior / (1.0 - prior)).ln();

        let params = TreeParams {
            max_leaves: self.config.num_leaves,
            min_samples_leaf: self.config.min_docs_per_leaf,
            l2: self.config.l2_regularization,
        };

        let mut raw = Array1::from_elem(n, initial_score);
        let mut trees = Vec::with_capacity(self.config.num_trees);

        for round in 0..self.config.num_trees {
            let probs: Vec<f64> = raw.iter().map(|&r| sigmoid(r)).collect();
            let gradients: Vec<f64> = probs.iter().zip(&y).map(|(p, t)| p - t).collect();
            let hessians: Vec<f64> = probs.iter().map(|p| (p * (1.0 - p)).max(1e-16)).collect();

            let tree = RegressionTree::fit(x, &gradients, &hessians, &params);
            let deltas: Vec<f64> = (0..n).into_par_iter().map(|i| tree.predict(x.row(i))).collect();
            for (r, d) in raw.iter_mut().zip(deltas) {
                *r += self.config.learning_rate * d;
            }

            debug!(round, leaves = tree.n_leaves(), "Boosting round");
            trees.push(tree);
        }

        Ok(BoostedTreesModel {
            initial_score,
            learning_rate: self.config.learning_rate,
            trees,
            n_features: x.ncols(),
        })
    }
}

impl Trainer for BoostedTreesTrainer {
    fn name(&self) -> &'static str {
        "fast_tree"
    }

    fn fit(&self, x: &Array2<f64>, labels: &[bool]) -> Result<Classifier> {
        self.fit_model(x, labels).map(Classifier::BoostedTrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Array2<f64>, Vec<bool>) {
        let x = Array2::from_shape_fn((60, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 7) as f64 });
        let y = (0..60).map(|i| i >= 30).collect();
        (x, y)
    }

    fn small_config() -> BoostedTreesConfig {
        BoostedTreesConfig::default()
            .with_num_trees(20)
            .with_num_leaves(4)
            .with_min_docs_per_leaf(2)
    }

    #[test]
    fn test_fits_separable_data() {
        let (x, y) = separable();
        let model = BoostedTreesTrainer::new(small_config()).fit_model(&x, &y).unwrap();
        assert_eq!(model.trees().len(), 20);

        let correct = (0..60).filter(|&i| (model.score(x.row(i)) > 0.0) == y[i]).count();
        assert_eq!(correct, 60);
    }

    #[test]
    fn test_initial_score_is_prior_log_odds() {
        let (x, _) = separable();
        let y: Vec<bool> = (0..60).map(|i| i < 15).collect();
        let model = BoostedTreesTrainer::new(small_config().with_num_trees(1))
            .fit_model(&x, &y)
            .unwrap();
        assert!((model.initial_score() - (0.25f64 / 0.75).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_stays_finite() {
        let (x, _) = separable();
        let y = vec![false; 60];
        let model = BoostedTreesTrainer::new(small_config()).fit_model(&x, &y).unwrap();
        let s = model.score(x.row(0));
        assert!(s.is_finite());
        assert!(s < 0.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(BoostedTreesConfig::default().validate().is_ok());
        assert!(BoostedTreesConfig::default().with_num_trees(0).validate().is_err());
        assert!(BoostedTreesConfig::default().with_num_leaves(1).validate().is_err());
        assert!(BoostedTreesConfig::default().with_learning_rate(0.0).validate().is_err());
        assert!(BoostedTreesConfig::default().with_min_docs_per_leaf(0).validate().is_err());
    }

    #[test]
    fn test_rejects_bad_input() {
        let trainer = BoostedTreesTrainer::default();
        let x = Array2::<f64>::zeros((0, 3));
        assert!(trainer.fit(&x, &[]).is_err());

        let x = Array2::<f64>::zeros((3, 3));
        assert!(trainer.fit(&x, &[true, false]).is_err());
    }
}
