//! Transaction records and in-memory datasets

use serde::{Deserialize, Serialize};

/// Number of predictive columns in a transaction (`V1..V28` + `Amount`)
pub const FEATURE_COUNT: usize = 29;

/// Predictive column names in their default concatenation order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "V1", "V2", "V3", "V4", "V5", "V6", "V7", "V8", "V9", "V10",
    "V11", "V12", "V13", "V14", "V15", "V16", "V17", "V18", "V19", "V20",
    "V21", "V22", "V23", "V24", "V25", "V26", "V27", "V28", "Amount",
];

/// One credit-card transaction.
///
/// `time` is carried so split files keep the source layout; it is never
/// used as a feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub time: f32,
    pub v: [f32; 28],
    pub amount: f32,
    pub label: bool,
}

impl Row {
    /// Position of a predictive column in [`FEATURE_NAMES`]
    pub fn feature_index(name: &str) -> Option<usize> {
        FEATURE_NAMES.iter().position(|n| *n == name)
    }

    /// Value of the predictive column at `idx` (see [`FEATURE_NAMES`])
    pub fn feature_at(&self, idx: usize) -> Option<f32> {
        match idx {
            0..=27 => Some(self.v[idx]),
            28 => Some(self.amount),
            _ => None,
        }
    }

    /// Value of a predictive column by name
    pub fn feature(&self, name: &str) -> Option<f32> {
        Self::feature_index(name).and_then(|idx| self.feature_at(idx))
    }

    /// All predictive values in [`FEATURE_NAMES`] order
    pub fn features(&self) -> [f32; FEATURE_COUNT] {
        let mut out = [0.0f32; FEATURE_COUNT];
        out[..28].copy_from_slice(&self.v);
        out[28] = self.amount;
        out
    }
}

/// Ordered, immutable sequence of rows sharing one schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    /// Labels in row order
    pub fn labels(&self) -> Vec<bool> {
        self.rows.iter().map(|r| r.label).collect()
    }

    /// Number of rows carrying `label`
    pub fn count_label(&self, label: bool) -> usize {
        self.rows.iter().filter(|r| r.label == label).count()
    }

    /// First `count` rows whose label equals `label`
    pub fn take_with_label(&self, label: bool, count: usize) -> Vec<&Row> {
        self.rows
            .iter()
            .filter(|r| r.label == label)
            .take(count)
            .collect()
    }

    /// New dataset made of the rows at `indices`, in the given order.
    /// Out-of-range indices are skipped.
    pub fn select(&self, indices: &[usize]) -> Dataset {
        indices
            .iter()
            .filter_map(|&i| self.rows.get(i).cloned())
            .collect()
    }
}

impl FromIterator<Row> for Dataset {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
