// Error type shared by the library modules.
// The variants follow the handful of failure kinds the launcher reports to
// the user; the UI prints them and returns to the menu.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    /// HTTP request failed or the server answered with a non-success status.
    #[error("network error: {0}")]
    Network(String),

    #[error("Xenia executable not found: {}", .0.display())]
    MissingExecutable(PathBuf),

    /// A file or folder the action depends on does not exist.
    #[error("{message}: {}", .path.display())]
    MissingPath { path: PathBuf, message: String },

    #[error("no matching asset in release {tag}: {wanted}")]
    NoAsset { tag: String, wanted: String },

    #[error("error extracting archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("config file is not valid JSON: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ManagerError {
    fn from(err: reqwest::Error) -> Self {
        ManagerError::Network(err.to_string())
    }
}

impl ManagerError {
    pub fn missing(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManagerError::MissingPath {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ManagerError>;
