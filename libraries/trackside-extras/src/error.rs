//! Error types for the organizer

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtrasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid glob pattern {pattern:?} in category {category:?}: {source}")]
    Pattern {
        category: String,
        pattern: String,
        source: globset::Error,
    },

    #[error("invalid path template {template:?}: {reason}")]
    Template { template: String, reason: String },

    #[error("invalid file path: {0}")]
    InvalidPath(String),

    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("copy verification failed: hash mismatch for {0}")]
    Verification(PathBuf),

    #[error("could not find a free destination near {0}")]
    ConflictExhausted(PathBuf),
}
