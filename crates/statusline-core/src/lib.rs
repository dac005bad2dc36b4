//! Telemetry aggregation engine for the statusline renderer.

pub mod aggregator;
pub mod clock;
pub mod context;
mod error;
pub mod git_branch;
pub mod render;
pub mod reverse_reader;
pub mod session_store;
pub mod session_tracker;
pub mod user_message;

pub use aggregator::{AggregatorConfig, StatusAggregator, StatusReport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{ContextUsage, Severity, SeverityThresholds};
pub use error::StatuslineError;
pub use git_branch::GitBranchCache;
pub use render::{Layout, RenderOptions, Renderer};
pub use reverse_reader::read_last_lines;
pub use session_store::SessionStore;
pub use session_tracker::{Persistence, SessionTracker, TrackerConfig};
pub use user_message::{MessageLimits, UserMessage};

/// Result type for statusline operations.
pub type Result<T> = std::result::Result<T, StatuslineError>;
