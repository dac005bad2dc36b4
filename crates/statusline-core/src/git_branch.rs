//! Current git branch lookup with a short-lived cache.

use crate::{Result, StatuslineError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// How long a resolved branch is reused.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);
/// Upper bound on a single git invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1500);

struct CachedBranch {
    dir: PathBuf,
    branch: String,
    expires_at: Instant,
}

impl CachedBranch {
    fn is_fresh_for(&self, dir: &Path) -> bool {
        self.dir == dir && Instant::now() < self.expires_at
    }
}

/// Resolves the branch checked out in a directory, caching hits for a TTL.
pub struct GitBranchCache {
    program: PathBuf,
    leading_args: Vec<OsString>,
    ttl: Duration,
    timeout: Duration,
    entry: RwLock<Option<CachedBranch>>,
}

impl GitBranchCache {
    pub fn new(ttl: Duration, timeout: Duration) -> Self {
        Self {
            program: PathBuf::from("git"),
            leading_args: Vec::new(),
            ttl,
            timeout,
            entry: RwLock::new(None),
        }
    }

    /// Run `program leading_args... branch --show-current` instead of plain `git`.
    pub fn with_command<I, S>(mut self, program: impl Into<PathBuf>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.program = program.into();
        self.leading_args = leading_args.into_iter().map(Into::into).collect();
        self
    }

    /// Branch name for `dir`. Empty when HEAD is detached.
    pub async fn current_branch(&self, dir: &Path) -> Result<String> {
        if let Some(branch) = self.cached(dir).await {
            trace!(target: "statusline::git", "Branch cache hit for {:?}", dir);
            return Ok(branch);
        }

        let mut entry = self.entry.write().await;

        // Another caller may have filled the entry while we waited for the lock.
        if let Some(cached) = entry.as_ref().filter(|c| c.is_fresh_for(dir)) {
            return Ok(cached.branch.clone());
        }

        let branch = self.query(dir).await?;
        if !branch.is_empty() {
            *entry = Some(CachedBranch {
                dir: dir.to_path_buf(),
                branch: branch.clone(),
                expires_at: Instant::now() + self.ttl,
            });
        }

        Ok(branch)
    }

    /// Cached branch for `dir`, if still fresh.
    pub async fn cached(&self, dir: &Path) -> Option<String> {
        self.entry
            .read()
            .await
            .as_ref()
            .filter(|c| c.is_fresh_for(dir))
            .map(|c| c.branch.clone())
    }

    async fn query(&self, dir: &Path) -> Result<String> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(["branch", "--show-current"])
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(target: "statusline::git", "Querying branch in {:?}", dir);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(output) => output?,
            Err(_) => return Err(StatuslineError::GitTimeout(self.timeout.as_millis())),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("not a git repository") {
                return Err(StatuslineError::NotARepository(dir.to_path_buf()));
            }
            return Err(StatuslineError::GitCommandFailed(if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            }));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for GitBranchCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_TIMEOUT)
    }
}
