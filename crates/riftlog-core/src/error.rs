//! Error types for Riftlog.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiftlogError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Invalid chat log header in {path}: {reason}")]
    InvalidHeader { path: PathBuf, reason: String },

    #[error("Directory watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
