//! Error types for workspace initialization.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while scaffolding `.showrunner/`.
#[derive(Error, Debug)]
pub enum InitError {
    /// The target directory already exists and `force` was not given.
    #[error("directory already exists: {0} (use --force to overwrite)")]
    DirectoryExists(PathBuf),

    /// An embedded template is missing from the binary.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Failed to create a directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Type alias for Result with InitError.
pub type InitResult<T> = Result<T, InitError>;
