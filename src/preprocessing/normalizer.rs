//! Mean-variance normalization fitted on training data

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::assembler::FeatureVector;
use crate::error::{FraudError, Result};

/// Normalization applied to assembled features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizationMode {
    /// `(x - mean) / stddev`
    MeanVariance,
    /// Pass features through unchanged
    None,
}

impl Default for NormalizationMode {
    fn default() -> Self {
        NormalizationMode::MeanVariance
    }
}

/// Per-column transform parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnParams {
    pub center: f64,
    pub scale: f64,
}

impl ColumnParams {
    const IDENTITY: ColumnParams = ColumnParams { center: 0.0, scale: 1.0 };
}

/// Fitted normalizer.
///
/// Statistics come from the matrix passed to [`fit`](Self::fit) only;
/// [`transform`](Self::transform) never updates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    mode: NormalizationMode,
    params: Vec<ColumnParams>,
}

impl Normalizer {
    /// Fit column statistics on `x`. `names` label columns in warnings.
    pub fn fit<S: AsRef<str>>(mode: NormalizationMode, x: &Array2<f64>, names: &[S]) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(FraudError::ValidationError(
                "cannot fit normalization on an empty matrix".to_string(),
            ));
        }

        let params = match mode {
            NormalizationMode::None => vec![ColumnParams::IDENTITY; x.ncols()],
            NormalizationMode::MeanVariance => x
                .axis_iter(Axis(1))
                .enumerate()
                .map(|(j, col)| {
                    let mean = col.mean().unwrap_or(0.0);
                    let std = col.var(0.0).sqrt();
                    let scale = if std > 0.0 && std.is_finite() {
                        std
                    } else {
                        let name = names.get(j).map(|n| n.as_ref()).unwrap_or("?");
                        warn!(column = name, "Zero variance column, keeping scale 1");
                        1.0
                    };
                    ColumnParams { center: mean, scale }
                })
                .collect(),
        };

        Ok(Self { mode, params })
    }

    pub fn mode(&self) -> NormalizationMode {
        self.mode
    }

    pub fn params(&self) -> &[ColumnParams] {
        &self.params
    }

    pub fn width(&self) -> usize {
        self.params.len()
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if width != self.params.len() {
            return Err(FraudError::SchemaError(format!(
                "normalizer fitted on {} features, got {}",
                self.params.len(),
                width
            )));
        }
        Ok(())
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;
        let mut out = x.clone();
        for (mut col, p) in out.axis_iter_mut(Axis(1)).zip(&self.params) {
            col.mapv_inplace(|v| (v - p.center) / p.scale);
        }
        Ok(out)
    }

    pub fn transform_vector(&self, features: &FeatureVector) -> Result<FeatureVector> {
        self.check_width(features.len())?;
        Ok(FeatureVector::new(
            features
                .as_slice()
                .iter()
                .zip(&self.params)
                .map(|(v, p)| (v - p.center) / p.scale)
                .collect(),
        ))
    }
}
