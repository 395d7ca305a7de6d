//! Seeded train/test and k-fold splitting

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::data::Dataset;
use crate::error::{FraudError, Result};

/// A single train/test partition of row indices
#[derive(Debug, Clone, PartialEq)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// One cross-validation fold, materialized
#[derive(Debug, Clone)]
pub struct Fold {
    /// 0-based fold index
    pub index: usize,
    pub train: Dataset,
    pub test: Dataset,
}

/// Deterministic splitter: the same seed always yields the same partition
#[derive(Debug, Clone, Copy)]
pub struct Splitter {
    seed: u64,
}

impl Splitter {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn shuffled(&self, n_samples: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);
        indices
    }

    /// Partition `n_samples` indices; the test side gets `round(n * test_fraction)`
    /// rows, kept within `[1, n - 1]`.
    pub fn train_test_indices(&self, n_samples: usize, test_fraction: f64) -> Result<CVSplit> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(FraudError::ConfigError(format!(
                "test fraction must be in (0, 1), got {}",
                test_fraction
            )));
        }
        if n_samples < 2 {
            return Err(FraudError::ValidationError(format!(
                "need at least 2 rows to split, got {}",
                n_samples
            )));
        }

        let n_test = ((n_samples as f64) * test_fraction).round() as usize;
        let n_test = n_test.clamp(1, n_samples - 1);

        let indices = self.shuffled(n_samples);
        let mut test_indices = indices[..n_test].to_vec();
        let mut train_indices = indices[n_test..].to_vec();
        test_indices.sort_unstable();
        train_indices.sort_unstable();

        Ok(CVSplit {
            train_indices,
            test_indices,
            fold_idx: 0,
        })
    }

    /// Split a dataset into disjoint `(train, test)` subsets
    pub fn train_test_split(&self, dataset: &Dataset, test_fraction: f64) -> Result<(Dataset, Dataset)> {
        let split = self.train_test_indices(dataset.len(), test_fraction)?;
        Ok((
            dataset.select(&split.train_indices),
            dataset.select(&split.test_indices),
        ))
    }

    /// K-fold index splits. Folds get `n / k` rows each and the last fold
    /// absorbs the remainder.
    pub fn k_fold_indices(&self, n_samples: usize, n_splits: usize) -> Result<Vec<CVSplit>> {
        if n_splits < 2 {
            return Err(FraudError::ConfigError(
                "number of folds must be at least 2".to_string(),
            ));
        }
        if n_samples < n_splits {
            return Err(FraudError::ValidationError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }

        let indices = self.shuffled(n_samples);
        let base = n_samples / n_splits;

        let mut splits = Vec::with_capacity(n_splits);
        for fold_idx in 0..n_splits {
            let start = fold_idx * base;
            let end = if fold_idx + 1 == n_splits { n_samples } else { start + base };

            let mut test_indices = indices[start..end].to_vec();
            let mut train_indices: Vec<usize> = indices[..start]
                .iter()
                .chain(indices[end..].iter())
                .copied()
                .collect();
            test_indices.sort_unstable();
            train_indices.sort_unstable();

            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });
        }

        Ok(splits)
    }

    /// Materialize k folds of `dataset`
    pub fn k_folds(&self, dataset: &Dataset, n_splits: usize) -> Result<Vec<Fold>> {
        Ok(self
            .k_fold_indices(dataset.len(), n_splits)?
            .into_iter()
            .map(|split| Fold {
                index: split.fold_idx,
                train: dataset.select(&split.train_indices),
                test: dataset.select(&split.test_indices),
            })
            .collect())
    }
}

/// Summary of per-fold scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        if n_folds == 0 {
            return Self {
                scores,
                mean_score: 0.0,
                std_score: 0.0,
                n_folds,
            };
        }
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;
        let std_score = variance.sqrt();

        Self {
            scores,
            mean_score,
            std_score,
            n_folds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;
    use std::collections::HashSet;

    fn dataset(n: usize) -> Dataset {
        (0..n)
            .map(|i| Row {
                time: i as f32,
                label: i % 3 == 0,
                ..Row::default()
            })
            .collect()
    }

    #[test]
    fn test_train_test_partition() {
        let split = Splitter::new(1).train_test_indices(100, 0.2).unwrap();
        assert_eq!(split.test_indices.len(), 20);
        assert_eq!(split.train_indices.len(), 80);

        let train: HashSet<_> = split.train_indices.iter().collect();
        assert!(split.test_indices.iter().all(|i| !train.contains(i)));

        let mut all: Vec<usize> = split.train_indices.iter().chain(&split.test_indices).copied().collect();
        all.sort();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_partition() {
        let ds = dataset(50);
        let (a_train, a_test) = Splitter::new(42).train_test_split(&ds, 0.3).unwrap();
        let (b_train, b_test) = Splitter::new(42).train_test_split(&ds, 0.3).unwrap();
        assert_eq!(a_train, b_train);
        assert_eq!(a_test, b_test);

        let (c_train, _) = Splitter::new(7).train_test_split(&ds, 0.3).unwrap();
        assert_ne!(a_train, c_train);
    }

    #[test]
    fn test_ten_rows_eight_two() {
        let (train, test) = Splitter::new(1).train_test_split(&dataset(10), 0.2).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
    }

    #[test]
    fn test_fraction_bounds() {
        let s = Splitter::new(1);
        assert!(matches!(s.train_test_indices(10, 0.0), Err(FraudError::ConfigError(_))));
        assert!(matches!(s.train_test_indices(10, 1.0), Err(FraudError::ConfigError(_))));
        assert!(matches!(s.train_test_indices(10, f64::NAN), Err(FraudError::ConfigError(_))));
        assert!(s.train_test_indices(1, 0.5).is_err());

        // tiny fractions still leave one test row
        let split = s.train_test_indices(3, 0.01).unwrap();
        assert_eq!(split.test_indices.len(), 1);
    }

    #[test]
    fn test_k_fold_last_absorbs_remainder() {
        let splits = Splitter::new(3).k_fold_indices(23, 5).unwrap();
        let sizes: Vec<usize> = splits.iter().map(|s| s.test_indices.len()).collect();
        assert_eq!(sizes, vec![4, 4, 4, 4, 7]);

        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort();
        assert_eq!(all_test, (0..23).collect::<Vec<_>>());

        for split in &splits {
            assert_eq!(split.train_indices.len() + split.test_indices.len(), 23);
        }
    }

    #[test]
    fn test_k_fold_validation() {
        let s = Splitter::new(0);
        assert!(matches!(s.k_fold_indices(10, 1), Err(FraudError::ConfigError(_))));
        assert!(matches!(s.k_fold_indices(3, 5), Err(FraudError::ValidationError(_))));
    }

    #[test]
    fn test_k_folds_materialized() {
        let ds = dataset(12);
        let folds = Splitter::new(9).k_folds(&ds, 3).unwrap();
        assert_eq!(folds.len(), 3);
        for (i, fold) in folds.iter().enumerate() {
            assert_eq!(fold.index, i);
            assert_eq!(fold.test.len(), 4);
            assert_eq!(fold.train.len(), 8);
        }
    }

    #[test]
    fn test_cv_results() {
        let r = CVResults::from_scores(vec![0.9, 1.0]);
        assert!((r.mean_score - 0.95).abs() < 1e-12);
        assert!((r.std_score - 0.05).abs() < 1e-12);
        assert_eq!(r.n_folds, 2);
    }
}
