use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixityError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Corrupt baseline {path}: {details}")]
    CorruptBaseline { path: PathBuf, details: String },

    #[error("Snapshot cannot be stored: {0}")]
    InvalidSnapshot(String),

    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Baseline was built with {baseline}, but {requested} was requested")]
    AlgorithmMismatch { baseline: String, requested: String },

    #[error("User input error: {0}")]
    UserInput(String),
}

impl FixityError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FixityError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<dialoguer::Error> for FixityError {
    fn from(err: dialoguer::Error) -> Self {
        FixityError::UserInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FixityError>;
