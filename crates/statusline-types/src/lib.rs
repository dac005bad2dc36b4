//! Shared types for the statusline renderer.

mod session;
mod snapshot;
mod transcript;

pub use session::*;
pub use snapshot::*;
pub use transcript::*;
