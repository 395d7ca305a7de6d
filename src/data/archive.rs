//! Source-file extraction from the distribution zip

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{FraudError, Result};
use crate::utils::fs::write_atomic;

/// Extract the entry whose file name is `entry_name` from `archive` into
/// `dest_dir`, returning the extracted path. Directory prefixes inside the
/// archive are ignored.
pub fn extract_entry(archive: &Path, entry_name: &str, dest_dir: &Path) -> Result<PathBuf> {
    let file = File::open(archive).map_err(|e| {
        FraudError::IoError(io::Error::new(
            e.kind(),
            format!("{}: {}", archive.display(), e),
        ))
    })?;
    let mut zip = zip::ZipArchive::new(file)?;

    let index = (0..zip.len())
        .find(|&i| {
            zip.by_index(i)
                .map(|entry| {
                    !entry.is_dir()
                        && Path::new(entry.name()).file_name().and_then(|n| n.to_str())
                            == Some(entry_name)
                })
                .unwrap_or(false)
        })
        .ok_or_else(|| {
            FraudError::DataError(format!(
                "{} does not contain {}",
                archive.display(),
                entry_name
            ))
        })?;

    let dest = dest_dir.join(entry_name);
    let mut entry = zip.by_index(index)?;
    write_atomic(&dest, |out| {
        io::copy(&mut entry, out)?;
        Ok(())
    })?;

    info!(archive = %archive.display(), dest = %dest.display(), "Extracted source data");
    Ok(dest)
}

/// Make sure the source CSV exists, extracting it from `archive` if not.
pub fn ensure_source(csv_path: &Path, archive: Option<&Path>) -> Result<PathBuf> {
    if csv_path.exists() {
        return Ok(csv_path.to_path_buf());
    }

    let entry_name = csv_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            FraudError::ConfigError(format!("invalid source path {}", csv_path.display()))
        })?;

    match archive {
        Some(zip_path) if zip_path.exists() => {
            extract_entry(zip_path, entry_name, crate::utils::fs::parent_dir(csv_path))
        }
        _ => Err(FraudError::IoError(io::Error::new(
            io::ErrorKind::NotFound,
            format!(
                "{} not found and no archive to extract it from{}",
                csv_path.display(),
                archive
                    .map(|a| format!(" ({} is missing)", a.display()))
                    .unwrap_or_default()
            ),
        ))),
    }
}
