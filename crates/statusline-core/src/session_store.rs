//! One-JSON-file-per-session persistence.

use crate::{Result, StatuslineError};
use statusline_types::SessionRecord;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Directory of `<session_id>.json` files.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Open the store, creating the directory if it does not exist.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Use a directory without touching the filesystem. Reads of a missing directory
    /// behave as an empty store; the first save creates it.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a session, rejecting ids that would escape the store directory.
    pub fn path_for(&self, session_id: &str) -> Result<PathBuf> {
        let valid = !session_id.is_empty()
            && session_id != "."
            && session_id != ".."
            && !session_id.contains(['/', '\\', '\0']);
        if !valid {
            return Err(StatuslineError::InvalidSessionId(session_id.to_string()));
        }
        Ok(self.dir.join(format!("{session_id}.json")))
    }

    /// Load a session. Missing file is `Ok(None)`; unparsable JSON is `CorruptSession`.
    pub fn load(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let path = self.path_for(session_id)?;
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|source| StatuslineError::CorruptSession { path, source })
    }

    /// Write a session atomically (temp file + rename).
    pub fn save(&self, record: &SessionRecord) -> Result<()> {
        let path = self.path_for(&record.id)?;
        fs::create_dir_all(&self.dir)?;

        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&serde_json::to_vec(record)?)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;

        trace!(target: "statusline::session", "Saved session {} to {:?}", record.id, path);
        Ok(())
    }

    /// Every readable session in the store. Unreadable or corrupt files are skipped.
    pub fn list(&self) -> Result<Vec<SessionRecord>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };

            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let data = match fs::read(&path) {
                Ok(d) => d,
                Err(e) => {
                    debug!(target: "statusline::session", "Skipping unreadable {:?}: {}", path, e);
                    continue;
                }
            };

            match serde_json::from_slice::<SessionRecord>(&data) {
                Ok(record) => records.push(record),
                Err(e) => {
                    debug!(target: "statusline::session", "Skipping corrupt {:?}: {}", path, e);
                }
            }
        }

        Ok(records)
    }
}
