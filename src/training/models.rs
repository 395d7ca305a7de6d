//! Fitted fraud model and its predictions

use chrono::{DateTime, Utc};
use ndarray::{ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::{sigmoid, Classifier};
use crate::data::{Dataset, Row};
use crate::error::{FraudError, Result};
use crate::preprocessing::{FeatureAssembler, Normalizer};

/// Scored row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Ground truth
    pub label: bool,
    pub predicted_label: bool,
    /// Raw margin
    pub score: f64,
    pub probability: f64,
}

impl Prediction {
    pub fn from_score(label: bool, score: f64) -> Self {
        Self {
            label,
            predicted_label: score > 0.0,
            score,
            probability: sigmoid(score),
        }
    }

    pub fn is_correct(&self) -> bool {
        self.label == self.predicted_label
    }
}

/// Trained artifact: feature layout, fitted normalizer and classifier.
///
/// The model only accepts rows assembled with the feature names it was
/// trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudModel {
    created_at: DateTime<Utc>,
    trainer: String,
    assembler: FeatureAssembler,
    normalizer: Normalizer,
    classifier: Classifier,
}

impl FraudModel {
    pub fn new(
        trainer: impl Into<String>,
        assembler: FeatureAssembler,
        normalizer: Normalizer,
        classifier: Classifier,
    ) -> Result<Self> {
        let model = Self {
            created_at: Utc::now(),
            trainer: trainer.into(),
            assembler,
            normalizer,
            classifier,
        };
        model.check_consistency()?;
        Ok(model)
    }

    /// Assembler, normalizer and classifier agree on the feature count
    pub fn check_consistency(&self) -> Result<()> {
        let width = self.assembler.width();
        if self.normalizer.width() != width || self.classifier.n_features() != width {
            return Err(FraudError::SchemaError(format!(
                "feature count mismatch: assembler {}, normalizer {}, classifier {}",
                width,
                self.normalizer.width(),
                self.classifier.n_features()
            )));
        }
        Ok(())
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn trainer(&self) -> &str {
        &self.trainer
    }

    pub fn feature_names(&self) -> &[String] {
        self.assembler.names()
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Fail unless the model was trained on exactly `expected`, in order
    pub fn ensure_features<S: AsRef<str>>(&self, expected: &[S]) -> Result<()> {
        let names = self.feature_names();
        let same = names.len() == expected.len()
            && names.iter().zip(expected).all(|(a, b)| a == b.as_ref());
        if !same {
            return Err(FraudError::SchemaError(format!(
                "model trained on [{}], expected [{}]",
                names.join(", "),
                expected.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", ")
            )));
        }
        Ok(())
    }

    pub fn predict(&self, row: &Row) -> Result<Prediction> {
        let features = self.assembler.assemble(row);
        let normalized = self.normalizer.transform_vector(&features)?;
        let score = self.classifier.score(ArrayView1::from(normalized.as_slice()));
        Ok(Prediction::from_score(row.label, score))
    }

    pub fn predict_dataset(&self, dataset: &Dataset) -> Result<Vec<Prediction>> {
        let x = self.normalizer.transform(&self.assembler.assemble_matrix(dataset))?;
        Ok(x.axis_iter(Axis(0))
            .zip(dataset.iter())
            .map(|(features, row)| Prediction::from_score(row.label, self.classifier.score(features)))
            .collect())
    }

    pub fn predict_rows<'a, I>(&self, rows: I) -> Result<Vec<Prediction>>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        rows.into_iter().map(|row| self.predict(row)).collect()
    }
}
