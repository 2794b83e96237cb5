use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Request is missing required data. The following items were missing: {}", .0.join(", "))]
    MissingRequiredData(Vec<String>),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Integrity(String),

    #[error("Failed to create directory `{}`: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Discovery directory, at `{}` does not exist", .0.display())]
    MissingDiscoveryDirectory(PathBuf),

    #[error("Discovery directory, `{}` must reference an existing directory instead of a file", .0.display())]
    DiscoveryNotADirectory(PathBuf),

    #[error("Partition invariant violated: {0}")]
    Partition(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_data_lists_fields() {
        let err = Error::MissingRequiredData(vec!["name".to_string(), "region".to_string()]);
        assert_eq!(
            err.to_string(),
            "Request is missing required data. The following items were missing: name, region"
        );
    }

    #[test]
    fn test_directory_errors_name_the_path() {
        let err = Error::MissingDiscoveryDirectory(PathBuf::from("/srv/discovery"));
        assert!(err.to_string().contains("/srv/discovery"));
    }
}
