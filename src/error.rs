//! Error types for the fraud detection workflow

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fraud workflow operations
pub type Result<T> = std::result::Result<T, FraudError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum FraudError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error at line {line}, column '{column}': {reason} (value: {value:?})")]
    ParseError {
        line: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Model not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("Corrupt artifact: {0}")]
    CorruptArtifact(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for FraudError {
    fn from(err: polars::error::PolarsError) -> Self {
        FraudError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for FraudError {
    fn from(err: serde_json::Error) -> Self {
        FraudError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for FraudError {
    fn from(err: ndarray::ShapeError) -> Self {
        FraudError::SchemaError(format!("invalid shape: {}", err))
    }
}

impl From<zip::result::ZipError> for FraudError {
    fn from(err: zip::result::ZipError) -> Self {
        FraudError::DataError(format!("archive: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FraudError::SchemaError("missing Amount".to_string());
        assert_eq!(err.to_string(), "Schema error: missing Amount");
    }

    #[test]
    fn test_parse_error_display() {
        let err = FraudError::ParseError {
            line: 4,
            column: "V3".to_string(),
            value: "abc".to_string(),
            reason: "not a number".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 4"));
        assert!(msg.contains("'V3'"));
        assert!(msg.contains("\"abc\""));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FraudError = io_err.into();
        assert!(matches!(err, FraudError::IoError(_)));
    }

    #[test]
    fn test_model_not_found_display() {
        let err = FraudError::ModelNotFound(PathBuf::from("Models/cv-fastTree.bin"));
        assert_eq!(err.to_string(), "Model not found: Models/cv-fastTree.bin");
    }
}
