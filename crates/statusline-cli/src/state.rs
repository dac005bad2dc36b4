//! Shared application state.

use crate::config::Config;
use statusline_core::{GitBranchCache, Renderer, SessionStore, SessionTracker, StatusAggregator};
use statusline_types::Snapshot;
use std::sync::Arc;

/// Everything one invocation needs to turn a snapshot into a status block.
pub struct AppState {
    pub aggregator: StatusAggregator,
    pub renderer: Renderer,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = match SessionStore::open(&config.sessions_dir) {
            Ok(store) => store,
            Err(e) => {
                // Rendering still works; heartbeats will fail and be logged individually
                tracing::warn!(
                    target: "statusline::session",
                    "Cannot create sessions dir {}: {}",
                    config.sessions_dir.display(),
                    e
                );
                SessionStore::at(&config.sessions_dir)
            }
        };

        let tracker = Arc::new(SessionTracker::new(store, config.tracker_config()));
        let git = Arc::new(GitBranchCache::new(config.git_cache_ttl(), config.git_timeout()));
        let aggregator = StatusAggregator::new(git, tracker, config.aggregator_config());
        let renderer = Renderer::new(config.render_options());

        Self {
            aggregator,
            renderer,
            config,
        }
    }

    /// Collect, render, then persist any debounced session writes.
    pub async fn render(&self, snapshot: &Snapshot) -> String {
        let report = self.aggregator.collect(snapshot).await;
        let output = self.renderer.render(&report);

        // A process lives for a single render, so nothing debounced may be left behind
        let tracker = Arc::clone(self.aggregator.tracker());
        match tokio::task::spawn_blocking(move || tracker.flush()).await {
            Ok(Ok(0)) => {}
            Ok(Ok(n)) => tracing::debug!(target: "statusline::session", "Flushed {} session(s)", n),
            Ok(Err(e)) => tracing::warn!(target: "statusline::session", "Failed to flush sessions: {}", e),
            Err(e) => tracing::warn!(target: "statusline::session", "Flush task failed: {}", e),
        }

        output
    }
}
