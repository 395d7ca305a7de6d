//! Feature concatenation

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data::{Dataset, Row, FEATURE_NAMES};
use crate::error::{FraudError, Result};

/// Fixed-order numeric encoding of a row's predictive columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Concatenates named row columns into a feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAssembler {
    names: Vec<String>,
    indices: Vec<usize>,
}

impl FeatureAssembler {
    /// Assemble the given columns in the given order. Unknown names and
    /// duplicates are schema errors.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if names.is_empty() {
            return Err(FraudError::SchemaError("feature list is empty".to_string()));
        }

        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let idx = Row::feature_index(name).ok_or_else(|| {
                FraudError::SchemaError(format!("'{}' is not a numeric feature column", name))
            })?;
            if indices.contains(&idx) {
                return Err(FraudError::SchemaError(format!("feature '{}' listed twice", name)));
            }
            indices.push(idx);
        }

        Ok(Self {
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            indices,
        })
    }

    /// `V1..V28, Amount`
    pub fn credit_card() -> Self {
        Self {
            names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            indices: (0..FEATURE_NAMES.len()).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn width(&self) -> usize {
        self.indices.len()
    }

    fn value(row: &Row, idx: usize) -> f64 {
        // indices are validated at construction
        row.feature_at(idx).map(f64::from).unwrap_or(0.0)
    }

    pub fn assemble(&self, row: &Row) -> FeatureVector {
        FeatureVector(self.indices.iter().map(|&idx| Self::value(row, idx)).collect())
    }

    /// Feature matrix with one row per dataset row
    pub fn assemble_matrix(&self, dataset: &Dataset) -> Array2<f64> {
        let rows = dataset.rows();
        Array2::from_shape_fn((rows.len(), self.indices.len()), |(i, j)| {
            Self::value(&rows[i], self.indices[j])
        })
    }
}

impl Default for FeatureAssembler {
    fn default() -> Self {
        Self::credit_card()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        let mut v = [0.0f32; 28];
        for (i, x) in v.iter_mut().enumerate() {
            *x = (i + 1) as f32;
        }
        Row { time: 99.0, v, amount: 250.0, label: true }
    }

    #[test]
    fn test_default_order() {
        let fv = FeatureAssembler::credit_card().assemble(&row());
        assert_eq!(fv.len(), 29);
        assert_eq!(fv.as_slice()[0], 1.0);
        assert_eq!(fv.as_slice()[27], 28.0);
        assert_eq!(fv.as_slice()[28], 250.0);
    }

    #[test]
    fn test_custom_order() {
        let assembler = FeatureAssembler::new(&["Amount", "V3", "V1"]).unwrap();
        let fv = assembler.assemble(&row());
        assert_eq!(fv.as_slice(), &[250.0, 3.0, 1.0]);
    }

    #[test]
    fn test_unknown_and_duplicate_names() {
        assert!(matches!(FeatureAssembler::new(&["Time"]), Err(FraudError::SchemaError(_))));
        assert!(matches!(FeatureAssembler::new(&["V1", "V1"]), Err(FraudError::SchemaError(_))));
        let empty: [&str; 0] = [];
        assert!(FeatureAssembler::new(&empty).is_err());
    }

    #[test]
    fn test_matrix_matches_rows() {
        let ds = Dataset::new(vec![row(), Row::default()]);
        let assembler = FeatureAssembler::new(&["V2", "Amount"]).unwrap();
        let x = assembler.assemble_matrix(&ds);
        assert_eq!(x.shape(), &[2, 2]);
        assert_eq!(x[[0, 0]], 2.0);
        assert_eq!(x[[0, 1]], 250.0);
        assert_eq!(x[[1, 1]], 0.0);
    }
}
