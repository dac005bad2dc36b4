//! Common test utilities for integration tests.

#![allow(dead_code)]

use serde_json::json;
use statusline_types::{ModelInfo, Snapshot, WorkspaceInfo};
use std::path::{Path, PathBuf};

pub const FIXTURE_SESSION: &str = "fixture-session";

/// Path to a transcript fixture in the workspace `tests/fixtures` directory.
pub fn transcript_fixture(name: &str) -> PathBuf {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("tests")
        .join("fixtures")
        .join("transcripts")
        .join(format!("{}.jsonl", name));

    assert!(path.exists(), "Missing fixture {}", path.display());
    path
}

/// A snapshot for the fixture session, rooted in `project_dir`.
pub fn snapshot(model: &str, project_dir: &Path, transcript: Option<PathBuf>) -> Snapshot {
    Snapshot {
        model: ModelInfo {
            display_name: model.to_string(),
        },
        session_id: FIXTURE_SESSION.to_string(),
        workspace: WorkspaceInfo {
            current_dir: project_dir.to_path_buf(),
        },
        transcript_path: transcript,
    }
}

/// The same snapshot as the JSON the host CLI writes to stdin.
pub fn snapshot_json(model: &str, project_dir: &Path, transcript: Option<&Path>) -> String {
    json!({
        "model": {"id": "ignored", "display_name": model},
        "session_id": FIXTURE_SESSION,
        "cwd": project_dir,
        "workspace": {"current_dir": project_dir, "project_dir": project_dir},
        "transcript_path": transcript,
    })
    .to_string()
}
