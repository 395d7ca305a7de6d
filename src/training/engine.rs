//! Training engine: assemble, normalize, fit

use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::models::FraudModel;
use super::{Trainer, TrainerConfig};
use crate::data::Dataset;
use crate::error::{FraudError, Result};
use crate::preprocessing::{FeatureAssembler, NormalizationMode, Normalizer};

/// Fits a [`FraudModel`] from a training dataset
#[derive(Clone)]
pub struct TrainEngine {
    assembler: FeatureAssembler,
    normalization: NormalizationMode,
    trainer: Arc<dyn Trainer>,
}

impl fmt::Debug for TrainEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainEngine")
            .field("features", &self.assembler.names())
            .field("normalization", &self.normalization)
            .field("trainer", &self.trainer.name())
            .finish()
    }
}

impl TrainEngine {
    pub fn new(assembler: FeatureAssembler, normalization: NormalizationMode, trainer: Arc<dyn Trainer>) -> Self {
        Self {
            assembler,
            normalization,
            trainer,
        }
    }

    pub fn from_config(
        assembler: FeatureAssembler,
        normalization: NormalizationMode,
        trainer: &TrainerConfig,
    ) -> Result<Self> {
        trainer.validate()?;
        Ok(Self::new(assembler, normalization, trainer.build()))
    }

    pub fn assembler(&self) -> &FeatureAssembler {
        &self.assembler
    }

    pub fn trainer_name(&self) -> &'static str {
        self.trainer.name()
    }

    /// Fit normalization and the classifier on `train` only
    pub fn fit(&self, train: &Dataset) -> Result<FraudModel> {
        if train.is_empty() {
            return Err(FraudError::TrainingError("training set is empty".to_string()));
        }

        let start = Instant::now();
        let x = self.assembler.assemble_matrix(train);
        let normalizer = Normalizer::fit(self.normalization, &x, self.assembler.names())?;
        let x = normalizer.transform(&x)?;
        let classifier = self.trainer.fit(&x, &train.labels())?;

        info!(
            trainer = self.trainer.name(),
            rows = train.len(),
            features = self.assembler.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Model trained"
        );

        FraudModel::new(self.trainer.name(), self.assembler.clone(), normalizer, classifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;
    use crate::training::{BoostedTreesConfig, LinearConfig};

    fn dataset(n: usize) -> Dataset {
        (0..n)
            .map(|i| {
                let fraud = i % 2 == 0;
                let mut row = Row { amount: 100.0 + i as f32, label: fraud, ..Row::default() };
                row.v[2] = if fraud { -3.0 } else { 1.0 };
                row.v[10] = (i % 5) as f32;
                row
            })
            .collect()
    }

    #[test]
    fn test_fit_linear() {
        let engine = TrainEngine::from_config(
            FeatureAssembler::credit_card(),
            NormalizationMode::MeanVariance,
            &TrainerConfig::Logistic(LinearConfig::default()),
        )
        .unwrap();
        let ds = dataset(20);
        let model = engine.fit(&ds).unwrap();
        assert_eq!(model.trainer(), "logistic");
        assert_eq!(model.feature_names().len(), 29);

        let preds = model.predict_dataset(&ds).unwrap();
        assert!(preds.iter().all(|p| p.is_correct()));
    }

    #[test]
    fn test_fit_boosted_trees() {
        let config = BoostedTreesConfig::default()
            .with_num_trees(10)
            .with_num_leaves(4)
            .with_min_docs_per_leaf(2);
        let engine = TrainEngine::from_config(
            FeatureAssembler::credit_card(),
            NormalizationMode::MeanVariance,
            &TrainerConfig::FastTree(config),
        )
        .unwrap();
        let ds = dataset(30);
        let model = engine.fit(&ds).unwrap();
        assert_eq!(model.trainer(), "fast_tree");
        let correct = model.predict_dataset(&ds).unwrap().iter().filter(|p| p.is_correct()).count();
        assert_eq!(correct, 30);
    }

    #[test]
    fn test_empty_training_set() {
        let engine = TrainEngine::from_config(
            FeatureAssembler::credit_card(),
            NormalizationMode::MeanVariance,
            &TrainerConfig::default(),
        )
        .unwrap();
        assert!(matches!(engine.fit(&Dataset::default()), Err(FraudError::TrainingError(_))));
    }

    #[test]
    fn test_invalid_hyperparameters() {
        let bad = TrainerConfig::FastTree(BoostedTreesConfig::default().with_learning_rate(-0.1));
        let result = TrainEngine::from_config(FeatureAssembler::credit_card(), NormalizationMode::None, &bad);
        assert!(matches!(result, Err(FraudError::ConfigError(_))));
    }
}
