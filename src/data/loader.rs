//! Delimited-file loading and saving
//!
//! Polars does the tokenizing (quotes, separators, header). Every column is
//! read as text and each cell is then parsed against its schema type, so a
//! malformed value fails the load instead of being coerced.

use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::row::{Dataset, Row};
use super::schema::{Binding, ColumnKind, Schema};
use crate::error::{FraudError, Result};
use crate::utils::fs::write_atomic;

/// Delimited-file reader/writer bound to one schema
#[derive(Debug, Clone)]
pub struct DataLoader {
    schema: Schema,
    delimiter: u8,
    has_header: bool,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(Schema::credit_card())
    }
}

impl DataLoader {
    /// Comma-separated with a header row
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            delimiter: b',',
            has_header: true,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Load and fully materialize a delimited file
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let start = Instant::now();
        let bindings = self.schema.bind()?;

        let file = File::open(path).map_err(|e| {
            FraudError::IoError(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;

        let parse_opts = CsvParseOptions::default().with_separator(self.delimiter);
        let df = CsvReadOptions::default()
            .with_has_header(self.has_header)
            .with_infer_schema_length(Some(0))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|err| match find_ragged_line(path, self.delimiter) {
                Ok(Some(parse_err)) => parse_err,
                _ => FraudError::from(err),
            })?;

        let dataset = self.rows_from_frame(&df, &bindings)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            fraud = dataset.count_label(true),
            elapsed = ?start.elapsed(),
            "Loaded dataset"
        );
        Ok(dataset)
    }

    fn rows_from_frame(&self, df: &DataFrame, bindings: &[Binding]) -> Result<Dataset> {
        self.schema.check_width(df.width())?;

        let frame_columns = df.get_columns();
        let mut cells: Vec<(&Binding, &StringChunked)> = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let series = frame_columns[binding.column.position].as_materialized_series();
            let ca = series.str().map_err(|e| {
                FraudError::DataError(format!("column '{}': {}", binding.column.name, e))
            })?;
            cells.push((binding, ca));
        }

        let header_lines = usize::from(self.has_header);
        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let line = i + 1 + header_lines;
            let mut row = Row::default();
            for (binding, ca) in &cells {
                parse_cell(ca.get(i), binding, line, &mut row)?;
            }
            rows.push(row);
        }
        debug!(rows = rows.len(), columns = cells.len(), "Bound rows to schema");

        Ok(Dataset::new(rows))
    }

    /// Write `dataset` in the layout [`load_csv`](Self::load_csv) reads back.
    ///
    /// The write goes through a temp file, so an interrupted save never
    /// leaves a partial file at `path`.
    pub fn save_csv(&self, dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut bindings = self.schema.bind()?;
        bindings.sort_by_key(|b| b.column.position);
        for (expected, binding) in bindings.iter().enumerate() {
            if binding.column.position != expected {
                return Err(FraudError::SchemaError(format!(
                    "cannot write a file with a gap before column '{}' (position {})",
                    binding.column.name, binding.column.position
                )));
            }
        }

        let columns: Vec<Column> = bindings
            .iter()
            .map(|b| {
                let values: Vec<String> = dataset.iter().map(|r| b.field.get_text(r)).collect();
                Series::new(b.column.name.as_str().into(), values).into()
            })
            .collect();
        let mut df = DataFrame::new(columns)?;

        let delimiter = self.delimiter;
        let has_header = self.has_header;
        write_atomic(path, |file| {
            CsvWriter::new(file)
                .include_header(has_header)
                .with_separator(delimiter)
                .finish(&mut df)?;
            Ok(())
        })?;

        info!(path = %path.display(), rows = dataset.len(), "Saved dataset");
        Ok(())
    }
}

/// Fields of one line. Delimiters inside double quotes do not split.
fn split_fields(line: &str, delimiter: u8) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, b) in line.bytes().enumerate() {
        if b == b'"' {
            quoted = !quoted;
        } else if b == delimiter && !quoted {
            fields.push(&line[start..i]);
            start = i + 1;
        }
    }
    fields.push(&line[start..]);
    fields
}

/// First line holding more fields than the first line of the file.
///
/// Polars rejects such rows without a position, so the file is rescanned to
/// report where the extra field sits.
fn find_ragged_line(path: &Path, delimiter: u8) -> Result<Option<FraudError>> {
    let reader = BufReader::new(File::open(path)?);
    let mut expected = None;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let fields = split_fields(line, delimiter);
        match expected {
            None => expected = Some(fields.len()),
            Some(width) if fields.len() > width => {
                return Ok(Some(FraudError::ParseError {
                    line: i + 1,
                    column: format!("field {}", width + 1),
                    value: fields[width].trim().to_string(),
                    reason: format!("expected {} fields, found {}", width, fields.len()),
                }));
            }
            Some(_) => {}
        }
    }
    Ok(None)
}

fn parse_cell(raw: Option<&str>, binding: &Binding, line: usize, row: &mut Row) -> Result<()> {
    let column = &binding.column;
    let fail = |value: &str, reason: &str| FraudError::ParseError {
        line,
        column: column.name.clone(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let text = raw.map(str::trim).unwrap_or("");
    if text.is_empty() {
        return Err(fail(text, "missing value"));
    }

    match column.kind {
        ColumnKind::Float => {
            let value: f32 = text.parse().map_err(|_| fail(text, "not a number"))?;
            if !value.is_finite() {
                return Err(fail(text, "not a finite number"));
            }
            binding.field.set_float(row, value);
        }
        ColumnKind::Bool => {
            let value = parse_bool(text).ok_or_else(|| fail(text, "not a boolean"))?;
            binding.field.set_bool(row, value);
        }
    }
    Ok(())
}

/// `0`/`1`/`true`/`false`, case-insensitive
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "1" => Some(true),
        "0" => Some(false),
        t if t.eq_ignore_ascii_case("true") => Some(true),
        t if t.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn header() -> String {
        let mut cols = vec!["Time".to_string()];
        cols.extend((1..=28).map(|i| format!("V{}", i)));
        cols.push("Amount".to_string());
        cols.push("Class".to_string());
        cols.join(",")
    }

    fn line(time: u32, label: &str) -> String {
        let mut cells = vec![time.to_string()];
        cells.extend((1..=28).map(|i| format!("{}.5", i)));
        cells.push("12.25".to_string());
        cells.push(label.to_string());
        cells.join(",")
    }

    fn create_test_csv(lines: &[String]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", header()).unwrap();
        for l in lines {
            writeln!(file, "{}", l).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = create_test_csv(&[line(0, "\"0\""), line(1, "\"1\""), line(2, "0")]);
        let ds = DataLoader::default().load_csv(file.path()).unwrap();

        assert_eq!(ds.len(), 3);
        let r = &ds.rows()[1];
        assert_eq!(r.time, 1.0);
        assert_eq!(r.v[0], 1.5);
        assert_eq!(r.v[27], 28.5);
        assert_eq!(r.amount, 12.25);
        assert!(r.label);
        assert!(!ds.rows()[2].label);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = DataLoader::default().load_csv("/nonexistent/creditcard.csv");
        assert!(matches!(result, Err(FraudError::IoError(_))));
    }

    #[test]
    fn test_malformed_number_fails_fast() {
        let mut bad = line(1, "0");
        bad = bad.replacen("3.5", "abc", 1);
        let file = create_test_csv(&[line(0, "0"), bad]);
        let err = DataLoader::default().load_csv(file.path()).unwrap_err();
        match err {
            FraudError::ParseError { line, column, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, "V3");
                assert_eq!(value, "abc");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_label_fails_fast() {
        let file = create_test_csv(&[line(0, "yes")]);
        let err = DataLoader::default().load_csv(file.path()).unwrap_err();
        assert!(matches!(err, FraudError::ParseError { ref column, .. } if column == "Label"));
    }

    #[test]
    fn test_narrow_file_is_schema_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a,b,c").unwrap();
        writeln!(file, "1,2,3").unwrap();
        file.flush().unwrap();
        let err = DataLoader::default().load_csv(file.path()).unwrap_err();
        assert!(matches!(err, FraudError::SchemaError(_)));
    }

    #[test]
    fn test_save_then_load() {
        let file = create_test_csv(&[line(0, "1"), line(7, "0")]);
        let loader = DataLoader::default();
        let ds = loader.load_csv(file.path()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("split").join("trainData.csv");
        loader.save_csv(&ds, &out).unwrap();
        let reloaded = loader.load_csv(&out).unwrap();
        assert_eq!(ds, reloaded);
    }

    #[test]
    fn test_split_fields_respects_quotes() {
        assert_eq!(split_fields("1,\"a,b\",3", b','), vec!["1", "\"a,b\"", "3"]);
        assert_eq!(split_fields("x;y", b';'), vec!["x", "y"]);
        assert_eq!(split_fields("", b','), vec![""]);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("False"), Some(false));
        assert_eq!(parse_bool("2"), None);
    }
}
