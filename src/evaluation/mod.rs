//! Holdout evaluation and k-fold cross-validation

mod metrics;

pub use metrics::{auc, BinaryMetrics};

use tracing::info;

use crate::data::Dataset;
use crate::error::{FraudError, Result};
use crate::training::{CVResults, FraudModel, Prediction, Splitter, TrainEngine};

/// Predictions for a test set and their aggregate metrics
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub predictions: Vec<Prediction>,
    pub metrics: BinaryMetrics,
}

pub fn evaluate(model: &FraudModel, test: &Dataset) -> Result<Evaluation> {
    let predictions = model.predict_dataset(test)?;
    let metrics = BinaryMetrics::compute(&predictions)?;
    info!(
        rows = test.len(),
        accuracy = metrics.accuracy,
        auc = metrics.auc.unwrap_or(f64::NAN),
        "Evaluated model"
    );
    Ok(Evaluation { predictions, metrics })
}

#[derive(Debug, Clone)]
pub struct FoldResult {
    /// 0-based fold index
    pub index: usize,
    pub model: FraudModel,
    /// Held-out rows, aligned with `evaluation.predictions`
    pub test: Dataset,
    pub evaluation: Evaluation,
}

#[derive(Debug, Clone)]
pub struct CrossValidation {
    pub folds: Vec<FoldResult>,
}

impl CrossValidation {
    pub fn accuracies(&self) -> Vec<f64> {
        self.folds.iter().map(|f| f.evaluation.metrics.accuracy).collect()
    }

    /// Fold with the highest accuracy, first fold on ties
    pub fn best(&self) -> Option<&FoldResult> {
        select_best(&self.accuracies()).map(|i| &self.folds[i])
    }

    pub fn into_best(mut self) -> Option<FoldResult> {
        let idx = select_best(&self.accuracies())?;
        Some(self.folds.swap_remove(idx))
    }

    pub fn summary(&self) -> CVResults {
        CVResults::from_scores(self.accuracies())
    }
}

/// Index of the highest score. The earliest wins ties and NaN never wins.
pub fn select_best(scores: &[f64]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
        .map(|(i, _)| i)
}

/// Fit a fresh model per fold on the remaining folds and evaluate it on the
/// held-out one
pub fn cross_validate(engine: &TrainEngine, data: &Dataset, splitter: &Splitter, k: usize) -> Result<CrossValidation> {
    let folds = splitter.k_folds(data, k)?;
    let mut results = Vec::with_capacity(folds.len());

    for fold in folds {
        if fold.test.is_empty() {
            return Err(FraudError::ValidationError(format!("fold {} is empty", fold.index)));
        }
        let model = engine.fit(&fold.train)?;
        let evaluation = evaluate(&model, &fold.test)?;
        info!(
            fold = fold.index + 1,
            folds = k,
            accuracy = evaluation.metrics.accuracy,
            "Cross-validation fold done"
        );
        results.push(FoldResult {
            index: fold.index,
            model,
            test: fold.test,
            evaluation,
        });
    }

    Ok(CrossValidation { folds: results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;
    use crate::preprocessing::{FeatureAssembler, NormalizationMode};
    use crate::training::{LinearConfig, TrainerConfig};

    #[test]
    fn test_select_best_middle_fold() {
        assert_eq!(select_best(&[0.91, 0.95, 0.93]), Some(1));
    }

    #[test]
    fn test_select_best_first_wins_ties() {
        assert_eq!(select_best(&[0.9, 0.97, 0.97]), Some(1));
        assert_eq!(select_best(&[f64::NAN, 0.5, 0.5]), Some(1));
        assert_eq!(select_best(&[]), None);
        assert_eq!(select_best(&[f64::NAN]), None);
    }

    fn dataset(n: usize) -> Dataset {
        (0..n)
            .map(|i| {
                let fraud = i % 3 == 0;
                let mut row = Row { amount: (i % 7) as f32, label: fraud, ..Row::default() };
                row.v[0] = if fraud { 2.5 } else { -1.0 } + (i % 4) as f32 * 0.1;
                row
            })
            .collect()
    }

    #[test]
    fn test_cross_validate_fold_models() {
        let engine = TrainEngine::from_config(
            FeatureAssembler::credit_card(),
            NormalizationMode::MeanVariance,
            &TrainerConfig::Logistic(LinearConfig::default()),
        )
        .unwrap();
        let ds = dataset(30);
        let cv = cross_validate(&engine, &ds, &Splitter::new(1), 3).unwrap();

        assert_eq!(cv.folds.len(), 3);
        let total: usize = cv.folds.iter().map(|f| f.evaluation.predictions.len()).sum();
        assert_eq!(total, 30);
        for fold in &cv.folds {
            assert!((0.0..=1.0).contains(&fold.evaluation.metrics.accuracy));
            assert_eq!(fold.test.len(), fold.evaluation.predictions.len());
            for (row, p) in fold.test.iter().zip(&fold.evaluation.predictions) {
                assert_eq!(row.label, p.label);
            }
        }
        let held_out: usize = cv.folds.iter().map(|f| f.test.len()).sum();
        assert_eq!(held_out, ds.len());

        let summary = cv.summary();
        assert_eq!(summary.n_folds, 3);

        let best_idx = cv.best().unwrap().index;
        let best = cv.into_best().unwrap();
        assert_eq!(best.index, best_idx);
    }
}
