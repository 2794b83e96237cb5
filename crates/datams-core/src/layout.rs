use crate::config::AppConfig;
use crate::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The three filesystem roots the resolver works against, canonicalized.
#[derive(Debug, Clone)]
pub struct DirectoryLayout {
    pub processed: PathBuf,
    pub discovery: PathBuf,
    pub info: PathBuf,
}

impl DirectoryLayout {
    /// Create the upload and info directories and validate the discovery root.
    /// Any failure is fatal and names the offending path.
    pub fn prepare(config: &AppConfig) -> Result<Self, Error> {
        for dir in [config.pending_directory(), config.processed_directory()] {
            create_directory(&dir)?;
        }
        create_directory(&config.info_directory)?;
        validate_discovery_directory(&config.data_files.discovery_directory)?;

        Ok(Self {
            processed: fs::canonicalize(config.processed_directory())?,
            discovery: fs::canonicalize(&config.data_files.discovery_directory)?,
            info: fs::canonicalize(&config.info_directory)?,
        })
    }

    pub fn proposed_changes_path(&self) -> PathBuf {
        self.info.join("drf_proposed_changes.txt")
    }

    pub fn applied_changes_path(&self) -> PathBuf {
        self.info.join("drf_applied_changes.txt")
    }
}

fn create_directory(path: &Path) -> Result<(), Error> {
    fs::create_dir_all(path).map_err(|source| Error::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Ensured directory {}", path.display());
    Ok(())
}

pub fn validate_discovery_directory(path: &Path) -> Result<(), Error> {
    if !path.exists() {
        return Err(Error::MissingDiscoveryDirectory(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(Error::DiscoveryNotADirectory(path.to_path_buf()));
    }
    Ok(())
}
