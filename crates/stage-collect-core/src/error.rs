use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageCollectError {
    #[error("Source directory does not exist: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    SourceNotDirectory { path: PathBuf },

    #[error("Destination directory is not set (use --dest or [general].destination_root)")]
    DestinationNotSet,

    #[error("Source directory is not set (use --source or [general].source_root)")]
    SourceNotSet,

    #[error("Config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Invalid stage '{name}': {reason}")]
    InvalidStage { name: String, reason: String },

    #[error("Invalid file pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StageCollectError>;

impl StageCollectError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SourceNotFound { .. } | Self::SourceNotDirectory { .. } => 2,
            Self::SourceNotSet | Self::DestinationNotSet => 3,
            Self::ConfigNotFound { .. } | Self::ConfigParse { .. } => 4,
            Self::InvalidStage { .. } | Self::InvalidPattern(_) => 5,
            _ => 1,
        }
    }
}
