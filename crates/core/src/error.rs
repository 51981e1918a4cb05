use crate::extension::ExtensionError;
use std::path::PathBuf;
use thiserror::Error;

/// Conditions that stop a run before any file is scanned.
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error(transparent)]
    Extension(#[from] ExtensionError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
