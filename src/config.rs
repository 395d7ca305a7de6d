//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::{DataLoader, Schema, FEATURE_NAMES};
use crate::error::{FraudError, Result};
use crate::preprocessing::NormalizationMode;
use crate::training::TrainerConfig;

/// Settings for the train, predict and inspect commands.
///
/// File locations are relative to `data_dir` unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Working directory holding the input, split and model files
    pub data_dir: PathBuf,

    /// Source CSV
    pub source_file: PathBuf,

    /// Zip archive the source CSV is extracted from when missing
    pub archive_file: Option<PathBuf>,

    pub split_dir: PathBuf,

    pub model_file: PathBuf,

    pub delimiter: char,

    pub has_header: bool,

    /// Share of rows held out for the holdout evaluation
    pub test_fraction: f64,

    /// Cross-validation folds
    pub folds: usize,

    pub seed: u64,

    /// Rows of each label shown in samples
    pub sample_count: usize,

    /// Assembled feature columns, in order
    pub features: Vec<String>,

    pub normalization: NormalizationMode,

    pub trainer: TrainerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            source_file: PathBuf::from("Data/creditcard.csv"),
            archive_file: Some(PathBuf::from("Data/creditcardfraud.zip")),
            split_dir: PathBuf::from("SplitData"),
            model_file: PathBuf::from("Models/cv-fastTree.bin"),
            delimiter: ',',
            has_header: true,
            test_fraction: 0.2,
            folds: 5,
            seed: 1,
            sample_count: 2,
            features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            normalization: NormalizationMode::MeanVariance,
            trainer: TrainerConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON config; missing keys keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            FraudError::ConfigError(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_trainer(mut self, trainer: TrainerConfig) -> Self {
        self.trainer = trainer;
        self
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = features;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(FraudError::ConfigError(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.folds < 2 {
            return Err(FraudError::ConfigError(format!("folds must be at least 2, got {}", self.folds)));
        }
        if !self.delimiter.is_ascii() {
            return Err(FraudError::ConfigError(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            )));
        }
        if self.features.is_empty() {
            return Err(FraudError::ConfigError("features must not be empty".to_string()));
        }
        self.trainer.validate()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.data_dir.join(path)
    }

    pub fn source_path(&self) -> PathBuf {
        self.resolve(&self.source_file)
    }

    pub fn archive_path(&self) -> Option<PathBuf> {
        self.archive_file.as_deref().map(|p| self.resolve(p))
    }

    pub fn split_path(&self) -> PathBuf {
        self.resolve(&self.split_dir)
    }

    pub fn model_path(&self) -> PathBuf {
        self.resolve(&self.model_file)
    }

    pub fn loader(&self) -> DataLoader {
        DataLoader::new(Schema::credit_card())
            .with_delimiter(self.delimiter as u8)
            .with_header(self.has_header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::LinearConfig;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.features.len(), 29);
        assert_eq!(config.model_path(), PathBuf::from("./Models/cv-fastTree.bin"));
        assert_eq!(config.trainer.name(), "fast_tree");
    }

    #[test]
    fn test_paths_follow_data_dir() {
        let config = PipelineConfig::new().with_data_dir("/tmp/run");
        assert_eq!(config.source_path(), PathBuf::from("/tmp/run/Data/creditcard.csv"));
        assert_eq!(config.split_path(), PathBuf::from("/tmp/run/SplitData"));
        assert_eq!(
            config.archive_path(),
            Some(PathBuf::from("/tmp/run/Data/creditcardfraud.zip"))
        );
    }

    #[test]
    fn test_validation() {
        assert!(PipelineConfig::new().with_test_fraction(1.0).validate().is_err());
        assert!(PipelineConfig::new().with_folds(1).validate().is_err());
        assert!(PipelineConfig::new().with_features(Vec::new()).validate().is_err());
        let bad = PipelineConfig { delimiter: 'é', ..PipelineConfig::default() };
        assert!(matches!(bad.validate(), Err(FraudError::ConfigError(_))));
    }

    #[test]
    fn test_from_json_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"folds": 2, "seed": 7, "trainer": {{"kind": "logistic", "max_iterations": 50}}}}"#
        )
        .unwrap();

        let config = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.folds, 2);
        assert_eq!(config.seed, 7);
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(
            config.trainer,
            TrainerConfig::Logistic(LinearConfig::default().with_max_iterations(50))
        );
    }

    #[test]
    fn test_from_json_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"folds": 1}}"#).unwrap();
        assert!(PipelineConfig::from_json_file(file.path()).is_err());
        assert!(PipelineConfig::from_json_file("/definitely/not/here.json").is_err());
    }
}
