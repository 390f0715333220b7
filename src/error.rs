//! Error types for TARGETS generation.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort a generation run
#[derive(Error, Debug)]
pub enum BuckifyError {
    #[error("Failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Source tree root does not exist or is not a directory: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("Invalid extra dependencies JSON")]
    InvalidDependencies(#[from] serde_json::Error),

    #[error("Variable '{name}' required by library '{library}' not found in src.mk")]
    MissingVariable { name: String, library: String },

    #[error("Failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BuckifyError>;
