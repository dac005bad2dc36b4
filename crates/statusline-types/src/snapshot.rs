//! Input snapshot piped by the assistant CLI on every render.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Model information from the snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub display_name: String,
}

/// Workspace information from the snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    #[serde(default)]
    pub current_dir: PathBuf,
}

/// One render's worth of input state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub model: ModelInfo,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub workspace: WorkspaceInfo,
    /// Absent for a conversation that has not started yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<PathBuf>,
}

impl Snapshot {
    /// Final component of the workspace directory.
    pub fn project_name(&self) -> String {
        self.workspace
            .current_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Transcript path, treating an empty string the same as an absent one.
    pub fn transcript(&self) -> Option<&Path> {
        self.transcript_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}
