//! Persisted train/test splits
//!
//! When both split files exist the split step is skipped and the files are
//! reloaded, so reruns train on the same partition.

use std::path::{Path, PathBuf};
use tracing::info;

use super::loader::DataLoader;
use super::row::Dataset;
use crate::error::Result;
use crate::training::Splitter;
use crate::utils::fs::DirLock;

pub const TRAIN_FILE: &str = "trainData.csv";
pub const TEST_FILE: &str = "testData.csv";

/// Train/test data together with the source it came from, when the source
/// had to be read.
#[derive(Debug, Clone)]
pub struct SplitData {
    pub train: Dataset,
    pub test: Dataset,
    /// `None` when the split was reloaded from disk
    pub source: Option<Dataset>,
}

impl SplitData {
    pub fn reused(&self) -> bool {
        self.source.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct SplitCache {
    dir: PathBuf,
    loader: DataLoader,
}

impl SplitCache {
    pub fn new(dir: impl Into<PathBuf>, loader: DataLoader) -> Self {
        Self {
            dir: dir.into(),
            loader,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn train_path(&self) -> PathBuf {
        self.dir.join(TRAIN_FILE)
    }

    pub fn test_path(&self) -> PathBuf {
        self.dir.join(TEST_FILE)
    }

    /// Both split files are present
    pub fn exists(&self) -> bool {
        self.train_path().is_file() && self.test_path().is_file()
    }

    pub fn load_train(&self) -> Result<Dataset> {
        self.loader.load_csv(self.train_path())
    }

    pub fn load_test(&self) -> Result<Dataset> {
        self.loader.load_csv(self.test_path())
    }

    /// Write both split files while holding the directory lock
    pub fn store(&self, train: &Dataset, test: &Dataset) -> Result<()> {
        let _lock = DirLock::acquire(&self.dir)?;
        self.loader.save_csv(test, self.test_path())?;
        self.loader.save_csv(train, self.train_path())?;
        Ok(())
    }

    /// Reload the cached split, or read the source through `load_source`,
    /// split it and persist the result.
    pub fn load_or_split<F>(&self, load_source: F, splitter: &Splitter, test_fraction: f64) -> Result<SplitData>
    where
        F: FnOnce() -> Result<Dataset>,
    {
        if self.exists() {
            info!(dir = %self.dir.display(), "Reusing persisted split");
            return Ok(SplitData {
                train: self.load_train()?,
                test: self.load_test()?,
                source: None,
            });
        }

        let source = load_source()?;
        let (train, test) = splitter.train_test_split(&source, test_fraction)?;
        info!(
            train = train.len(),
            test = test.len(),
            seed = splitter.seed(),
            "Split source data"
        );
        self.store(&train, &test)?;

        Ok(SplitData {
            train,
            test,
            source: Some(source),
        })
    }
}
