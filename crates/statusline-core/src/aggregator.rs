//! Fan-out/fan-in collection of everything one render needs.
//!
//! The four lookups share no data, so they run as four tasks joined at a single point.
//! That join is also where each failure is reduced to its display default. The session
//! heartbeat runs only after the join so it never races the daily-summary scan.

use crate::context::{context_tokens, ContextUsage, DEFAULT_MAX_TOKENS};
use crate::git_branch::GitBranchCache;
use crate::session_tracker::SessionTracker;
use crate::user_message::{extract_user_message, MessageLimits, UserMessage};
use crate::{context, user_message, Result, StatuslineError};
use statusline_types::{DailySummary, Snapshot};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub transcript_window: usize,
    pub user_message_window: usize,
    pub max_context_tokens: u64,
    pub message_limits: MessageLimits,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            transcript_window: context::DEFAULT_WINDOW,
            user_message_window: user_message::DEFAULT_WINDOW,
            max_context_tokens: DEFAULT_MAX_TOKENS,
            message_limits: MessageLimits::default(),
        }
    }
}

/// Everything the renderer needs for one status block.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub model: String,
    pub project: String,
    pub branch: String,
    pub context: ContextUsage,
    pub today: DailySummary,
    pub user_message: Option<UserMessage>,
}

/// Owns the shared caches and runs one collection per render.
pub struct StatusAggregator {
    git: Arc<GitBranchCache>,
    tracker: Arc<SessionTracker>,
    config: AggregatorConfig,
}

impl StatusAggregator {
    pub fn new(git: Arc<GitBranchCache>, tracker: Arc<SessionTracker>, config: AggregatorConfig) -> Self {
        Self {
            git,
            tracker,
            config,
        }
    }

    pub fn tracker(&self) -> &Arc<SessionTracker> {
        &self.tracker
    }

    /// Gather all four inputs, then record the heartbeat.
    #[tracing::instrument(
        target = "statusline::aggregate",
        skip_all,
        fields(session = %snapshot.session_id)
    )]
    pub async fn collect(&self, snapshot: &Snapshot) -> StatusReport {
        let git = Arc::clone(&self.git);
        let dir = snapshot.workspace.current_dir.clone();
        let branch_task = tokio::spawn(async move { git.current_branch(&dir).await });

        let tracker = Arc::clone(&self.tracker);
        let summary_task = tokio::task::spawn_blocking(move || tracker.daily_summary());

        let transcript = snapshot.transcript().map(Path::to_path_buf);
        let context_path = transcript.clone();
        let window = self.config.transcript_window;
        let context_task =
            tokio::task::spawn_blocking(move || context_tokens(context_path.as_deref(), window));

        let session_id = snapshot.session_id.clone();
        let message_window = self.config.user_message_window;
        let message_task = tokio::task::spawn_blocking(move || {
            extract_user_message(transcript.as_deref(), &session_id, message_window)
        });

        let (branch, summary, tokens, message) =
            tokio::join!(branch_task, summary_task, context_task, message_task);

        let branch = settle("git branch", branch).unwrap_or_default();
        let today = settle("daily summary", summary).unwrap_or_default();
        let tokens = settle("context usage", tokens).unwrap_or(0);
        let user_message = settle("user message", message)
            .flatten()
            .and_then(|content| UserMessage::format(&content, self.config.message_limits));

        self.record_heartbeat(&snapshot.session_id).await;

        StatusReport {
            model: snapshot.model.display_name.clone(),
            project: snapshot.project_name(),
            branch,
            context: ContextUsage::new(tokens, self.config.max_context_tokens),
            today,
            user_message,
        }
    }

    async fn record_heartbeat(&self, session_id: &str) {
        if session_id.is_empty() {
            debug!(target: "statusline::aggregate", "No session id; skipping heartbeat");
            return;
        }

        let tracker = Arc::clone(&self.tracker);
        let id = session_id.to_string();
        let saved = tokio::task::spawn_blocking(move || tracker.heartbeat(&id)).await;
        if let Err(e) = saved.map_err(StatuslineError::from).and_then(|result| result) {
            warn!(
                target: "statusline::aggregate",
                "Failed to save session {}: {}",
                session_id,
                e
            );
        }
    }
}

/// Reduce a joined task to its value, logging why it had none.
fn settle<T>(what: &str, joined: std::result::Result<Result<T>, JoinError>) -> Option<T> {
    match joined.map_err(StatuslineError::from).and_then(|result| result) {
        Ok(value) => Some(value),
        Err(e @ (StatuslineError::NotARepository(_) | StatuslineError::InvalidSessionId(_))) => {
            debug!(target: "statusline::aggregate", "{} unavailable: {}", what, e);
            None
        }
        Err(e) if e.is_not_found() => {
            debug!(target: "statusline::aggregate", "{} unavailable: {}", what, e);
            None
        }
        Err(e) => {
            warn!(target: "statusline::aggregate", "{} failed: {}", what, e);
            None
        }
    }
}
