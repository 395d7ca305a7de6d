//! L2-regularized linear logistic classifier

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_training_input, sigmoid, Classifier, Trainer};
use crate::error::{FraudError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    pub l2: f64,
    pub max_iterations: usize,
    pub learning_rate: f64,
    /// Stop once the gradient norm drops below this
    pub tolerance: f64,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            l2: 1e-4,
            max_iterations: 500,
            learning_rate: 0.5,
            tolerance: 1e-6,
        }
    }
}

impl LinearConfig {
    pub fn with_l2(mut self, l2: f64) -> Self {
        self.l2 = l2;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(FraudError::ConfigError("max_iterations must be positive".into()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(FraudError::ConfigError(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.l2 >= 0.0 && self.l2.is_finite()) {
            return Err(FraudError::ConfigError("l2 must be non-negative".into()));
        }
        if !(self.tolerance > 0.0) {
            return Err(FraudError::ConfigError("tolerance must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    weights: Array1<f64>,
    bias: f64,
}

impl LinearModel {
    pub fn score(&self, features: ArrayView1<f64>) -> f64 {
        features.dot(&self.weights) + self.bias
    }

    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }
}

#[derive(Debug, Clone, Default)]
pub struct LinearTrainer {
    config: LinearConfig,
}

impl LinearTrainer {
    pub fn new(config: LinearConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LinearConfig {
        &self.config
    }

    /// Full-batch gradient descent on the mean logistic loss
    pub fn fit_model(&self, x: &Array2<f64>, labels: &[bool]) -> Result<LinearModel> {
        self.config.validate()?;
        check_training_input(x, labels)?;

        let n = x.nrows() as f64;
        let y: Array1<f64> = labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();
        let lr = self.config.learning_rate;
        let l2 = self.config.l2;

        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut bias = 0.0;

        for iter in 0..self.config.max_iterations {
            let margin = x.dot(&weights) + bias;
            let errors = margin.mapv(sigmoid) - &y;

            let dw = x.t().dot(&errors) / n + l2 * &weights;
            let db = errors.sum() / n;

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if !grad_norm.is_finite() {
                return Err(FraudError::TrainingError(format!(
                    "gradient diverged at iteration {}",
                    iter
                )));
            }
            if grad_norm < self.config.tolerance {
                debug!(iter, grad_norm, "Linear trainer converged");
                break;
            }

            weights = weights - lr * dw;
            bias -= lr * db;
        }

        Ok(LinearModel { weights, bias })
    }
}

impl Trainer for LinearTrainer {
    fn name(&self) -> &'static str {
        "logistic"
    }

    fn fit(&self, x: &Array2<f64>, labels: &[bool]) -> Result<Classifier> {
        self.fit_model(x, labels).map(Classifier::Linear)
    }
}
