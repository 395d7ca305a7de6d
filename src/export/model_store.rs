//! Checksummed model artifacts
//!
//! Layout:
//!
//! | bytes | field                         |
//! |-------|-------------------------------|
//! | 4     | magic `CFMD`                  |
//! | 2     | format version, LE            |
//! | 8     | payload length, LE            |
//! | 32    | SHA-256 of the payload        |
//! | n     | bincode-encoded `FraudModel`  |

use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{FraudError, Result};
use crate::training::FraudModel;
use crate::utils::fs::{parent_dir, write_atomic, DirLock};

const MAGIC: &[u8; 4] = b"CFMD";
pub const FORMAT_VERSION: u16 = 1;
const CHECKSUM_LEN: usize = 32;
const HEADER_LEN: usize = 4 + 2 + 8 + CHECKSUM_LEN;

fn encode(model: &FraudModel) -> Result<Vec<u8>> {
    let payload = bincode::serialize(model)
        .map_err(|e| FraudError::SerializationError(format!("Failed to encode model: {}", e)))?;
    let checksum: [u8; CHECKSUM_LEN] = Sha256::digest(&payload).into();

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&checksum);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

fn decode(bytes: &[u8]) -> Result<FraudModel> {
    let corrupt = |msg: String| FraudError::CorruptArtifact(msg);

    if bytes.len() < HEADER_LEN {
        return Err(corrupt(format!("truncated header ({} bytes)", bytes.len())));
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    if &header[..4] != MAGIC {
        return Err(corrupt("bad magic number".to_string()));
    }

    let mut version = [0u8; 2];
    version.copy_from_slice(&header[4..6]);
    let version = u16::from_le_bytes(version);
    if version != FORMAT_VERSION {
        return Err(corrupt(format!("unsupported format version {}", version)));
    }

    let mut len = [0u8; 8];
    len.copy_from_slice(&header[6..14]);
    let len = u64::from_le_bytes(len);
    if len != payload.len() as u64 {
        return Err(corrupt(format!(
            "payload length {} does not match header ({})",
            payload.len(),
            len
        )));
    }

    let actual: [u8; CHECKSUM_LEN] = Sha256::digest(payload).into();
    if actual[..] != header[14..HEADER_LEN] {
        return Err(corrupt("checksum mismatch".to_string()));
    }

    let model: FraudModel =
        bincode::deserialize(payload).map_err(|e| corrupt(format!("undecodable payload: {}", e)))?;
    model
        .check_consistency()
        .map_err(|e| corrupt(e.to_string()))?;
    Ok(model)
}

/// Persist `model` at `path`, creating parent directories
pub fn save(model: &FraudModel, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode(model)?;
    let _lock = DirLock::acquire(parent_dir(path))?;
    write_atomic(path, |file| {
        file.write_all(&bytes)?;
        Ok(())
    })?;
    info!(path = %path.display(), bytes = bytes.len(), trainer = model.trainer(), "Saved model");
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> Result<FraudModel> {
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(FraudError::ModelNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    let model = decode(&bytes)?;
    debug!(path = %path.display(), trainer = model.trainer(), "Loaded model");
    Ok(model)
}

/// Load and check the model was trained on exactly `expected` features
pub fn load_for_features<S: AsRef<str>>(path: impl AsRef<Path>, expected: &[S]) -> Result<FraudModel> {
    let model = load(path)?;
    model.ensure_features(expected)?;
    Ok(model)
}

/// Named models under one directory
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    pub fn save(&self, model: &FraudModel, name: &str) -> Result<PathBuf> {
        let path = self.path_for(name);
        save(model, &path)?;
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<FraudModel> {
        load(self.path_for(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, Row};
    use crate::preprocessing::{FeatureAssembler, NormalizationMode};
    use crate::training::{BoostedTreesConfig, TrainEngine, TrainerConfig};

    fn dataset() -> Dataset {
        (0..24)
            .map(|i| {
                let mut row = Row { amount: (i * 3) as f32, label: i % 4 == 0, ..Row::default() };
                row.v[3] = if i % 4 == 0 { 4.0 } else { -0.5 };
                row
            })
            .collect()
    }

    fn model() -> FraudModel {
        let config = BoostedTreesConfig::default()
            .with_num_trees(5)
            .with_num_leaves(3)
            .with_min_docs_per_leaf(2);
        TrainEngine::from_config(
            FeatureAssembler::credit_card(),
            NormalizationMode::MeanVariance,
            &TrainerConfig::FastTree(config),
        )
        .unwrap()
        .fit(&dataset())
        .unwrap()
    }

    #[test]
    fn test_round_trip_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Models").join("cv-fastTree.bin");
        let model = model();
        save(&model, &path).unwrap();
        assert!(!dir.path().join("Models").join(DirLock::FILE_NAME).exists());

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, model);

        let ds = dataset();
        assert_eq!(loaded.predict_dataset(&ds).unwrap(), model.predict_dataset(&ds).unwrap());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path().join("nope.bin")).unwrap_err();
        assert!(matches!(err, FraudError::ModelNotFound(_)));
    }

    #[test]
    fn test_corruption_detected() {
        let bytes = encode(&model()).unwrap();

        let mut flipped = bytes.clone();
        let last = flipped.len() - 1;
        flipped[last] ^= 0xff;
        assert!(matches!(decode(&flipped), Err(FraudError::CorruptArtifact(_))));

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(matches!(decode(&bad_magic), Err(FraudError::CorruptArtifact(_))));

        let mut bad_version = bytes.clone();
        bad_version[4] = 9;
        assert!(matches!(decode(&bad_version), Err(FraudError::CorruptArtifact(_))));

        assert!(matches!(decode(&bytes[..bytes.len() - 3]), Err(FraudError::CorruptArtifact(_))));
        assert!(matches!(decode(&bytes[..10]), Err(FraudError::CorruptArtifact(_))));
    }

    #[test]
    fn test_load_for_features_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let path = store.save(&model(), "m.bin").unwrap();
        assert!(store.exists("m.bin"));

        assert!(load_for_features(&path, FeatureAssembler::credit_card().names()).is_ok());
        let err = load_for_features(&path, &["V1", "V2"]).unwrap_err();
        assert!(matches!(err, FraudError::SchemaError(_)));
    }
}
