//! Column schema for delimited transaction files
//!
//! A schema maps each column name to its semantic type and its 0-based
//! position in the source file. Binding a schema resolves every column to a
//! field of [`Row`], so loading is an explicit field-by-position mapping.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::row::Row;
use crate::error::{FraudError, Result};

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// 32-bit float
    Float,
    /// Boolean (`0`/`1`/`true`/`false`)
    Bool,
}

/// One column in the source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
    pub position: usize,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, kind: ColumnKind, position: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            position,
        }
    }
}

/// Field of [`Row`] a column is written into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowField {
    Time,
    V(usize),
    Amount,
    Label,
}

impl RowField {
    /// Resolve a column name to a row field
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Time" => Some(RowField::Time),
            "Amount" => Some(RowField::Amount),
            "Label" => Some(RowField::Label),
            _ => {
                let idx: usize = name.strip_prefix('V')?.parse().ok()?;
                (1..=28).contains(&idx).then_some(RowField::V(idx - 1))
            }
        }
    }

    /// Type the field expects
    pub fn kind(&self) -> ColumnKind {
        match self {
            RowField::Label => ColumnKind::Bool,
            _ => ColumnKind::Float,
        }
    }

    pub fn set_float(&self, row: &mut Row, value: f32) {
        match *self {
            RowField::Time => row.time = value,
            RowField::V(i) => row.v[i] = value,
            RowField::Amount => row.amount = value,
            RowField::Label => {}
        }
    }

    pub fn set_bool(&self, row: &mut Row, value: bool) {
        if let RowField::Label = self {
            row.label = value;
        }
    }

    pub fn get_text(&self, row: &Row) -> String {
        match *self {
            RowField::Time => row.time.to_string(),
            RowField::V(i) => row.v[i].to_string(),
            RowField::Amount => row.amount.to_string(),
            RowField::Label => if row.label { "1" } else { "0" }.to_string(),
        }
    }
}

/// A column bound to the row field it fills
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub column: ColumnDef,
    pub field: RowField,
}

/// Ordered set of column definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    /// Create a schema; names and positions must be unique
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self> {
        let mut names = HashSet::new();
        let mut positions = HashSet::new();
        for col in &columns {
            if !names.insert(col.name.as_str()) {
                return Err(FraudError::SchemaError(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
            if !positions.insert(col.position) {
                return Err(FraudError::SchemaError(format!(
                    "duplicate column position {} ('{}')",
                    col.position, col.name
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Layout of the credit-card transactions file:
    /// `Time, V1..V28, Amount, Class` at positions 0..=30.
    pub fn credit_card() -> Self {
        let mut columns = Vec::with_capacity(31);
        columns.push(ColumnDef::new("Time", ColumnKind::Float, 0));
        for i in 1..=28 {
            columns.push(ColumnDef::new(format!("V{}", i), ColumnKind::Float, i));
        }
        columns.push(ColumnDef::new("Amount", ColumnKind::Float, 29));
        columns.push(ColumnDef::new("Label", ColumnKind::Bool, 30));
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of source columns the schema spans (highest position + 1)
    pub fn width(&self) -> usize {
        self.columns.iter().map(|c| c.position + 1).max().unwrap_or(0)
    }

    /// Columns of the given kind, in declaration order
    pub fn columns_of(&self, kind: ColumnKind) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(move |c| c.kind == kind)
    }

    /// Fail if a referenced position is outside a row of `width` cells
    pub fn check_width(&self, width: usize) -> Result<()> {
        match self.columns.iter().find(|c| c.position >= width) {
            Some(col) => Err(FraudError::SchemaError(format!(
                "column '{}' at position {} is out of range for rows of {} columns",
                col.name, col.position, width
            ))),
            None => Ok(()),
        }
    }

    /// Resolve every column to a [`Row`] field.
    ///
    /// Fails if a name has no field, a type disagrees with the field, or a
    /// field is left unfilled.
    pub fn bind(&self) -> Result<Vec<Binding>> {
        let mut bindings = Vec::with_capacity(self.columns.len());
        let mut filled = HashSet::new();

        for col in &self.columns {
            let field = RowField::from_name(&col.name).ok_or_else(|| {
                FraudError::SchemaError(format!("column '{}' has no matching row field", col.name))
            })?;
            if field.kind() != col.kind {
                return Err(FraudError::SchemaError(format!(
                    "column '{}' declared {:?} but the row field is {:?}",
                    col.name,
                    col.kind,
                    field.kind()
                )));
            }
            filled.insert(col.name.as_str());
            bindings.push(Binding {
                column: col.clone(),
                field,
            });
        }

        let required = ["Time", "Amount", "Label"]
            .into_iter()
            .map(String::from)
            .chain((1..=28).map(|i| format!("V{}", i)));
        for name in required {
            if !filled.contains(name.as_str()) {
                return Err(FraudError::SchemaError(format!("missing column '{}'", name)));
            }
        }

        Ok(bindings)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::credit_card()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_card_layout() {
        let schema = Schema::credit_card();
        assert_eq!(schema.columns().len(), 31);
        assert_eq!(schema.width(), 31);
        assert_eq!(schema.columns_of(ColumnKind::Float).count(), 30);
        assert_eq!(schema.columns_of(ColumnKind::Bool).count(), 1);
        assert_eq!(schema.column("V1").unwrap().position, 1);
        assert_eq!(schema.column("Amount").unwrap().position, 29);
        assert_eq!(schema.column("Label").unwrap().position, 30);
    }

    #[test]
    fn test_bind_covers_every_field() {
        let bindings = Schema::credit_card().bind().unwrap();
        assert_eq!(bindings.len(), 31);
        assert_eq!(bindings[1].field, RowField::V(0));
        assert_eq!(bindings[30].field, RowField::Label);
    }

    #[test]
    fn test_check_width_out_of_range() {
        let schema = Schema::credit_card();
        assert!(schema.check_width(31).is_ok());
        let err = schema.check_width(30).unwrap_err();
        assert!(matches!(err, FraudError::SchemaError(_)));
        assert!(err.to_string().contains("Label"));
    }

    #[test]
    fn test_duplicate_position_rejected() {
        let result = Schema::new(vec![
            ColumnDef::new("V1", ColumnKind::Float, 1),
            ColumnDef::new("V2", ColumnKind::Float, 1),
        ]);
        assert!(matches!(result, Err(FraudError::SchemaError(_))));
    }

    #[test]
    fn test_bind_rejects_wrong_kind() {
        let mut columns = Schema::credit_card().columns().to_vec();
        columns[30].kind = ColumnKind::Float;
        let schema = Schema::new(columns).unwrap();
        assert!(matches!(schema.bind(), Err(FraudError::SchemaError(_))));
    }

    #[test]
    fn test_bind_rejects_missing_field() {
        let columns: Vec<_> = Schema::credit_card()
            .columns()
            .iter()
            .filter(|c| c.name != "V7")
            .cloned()
            .collect();
        let err = Schema::new(columns).unwrap().bind().unwrap_err();
        assert!(err.to_string().contains("V7"));
    }

    #[test]
    fn test_row_field_names() {
        assert_eq!(RowField::from_name("V28"), Some(RowField::V(27)));
        assert_eq!(RowField::from_name("V29"), None);
        assert_eq!(RowField::from_name("V0"), None);
        assert_eq!(RowField::from_name("Class"), None);
    }
}
