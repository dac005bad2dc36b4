//! Error types for the statusline engine.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatuslineError {
    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),

    #[error("Corrupt session file {path}: {source}")]
    CorruptSession {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("git command failed: {0}")]
    GitCommandFailed(String),

    #[error("git command timed out after {0}ms")]
    GitTimeout(u128),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StatuslineError {
    /// True when the underlying cause is a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StatuslineError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
