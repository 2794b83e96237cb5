use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub data_files: DataFilesConfig,
    pub info_directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataFilesConfig {
    pub upload_directory: PathBuf,
    pub discovery_directory: PathBuf,
}

impl AppConfig {
    /// Uploads land here first, before processing.
    pub fn pending_directory(&self) -> PathBuf {
        self.data_files.upload_directory.join("pending")
    }

    /// Root of the processed-uploads tree scanned during file resolution.
    pub fn processed_directory(&self) -> PathBuf {
        self.data_files.upload_directory.join("processed")
    }
}

/// Load `Config.toml` (optional) with `DATAMS__SECTION__KEY` environment overrides.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .set_default("database.path", "datams.db")?
        .set_default("data_files.upload_directory", "./data/uploads")?
        .set_default("data_files.discovery_directory", "./data/discovery")?
        .set_default("info_directory", "./data/info")?
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("DATAMS").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
