//! Statusline library - exposes modules for testing.

pub mod config;
pub mod logging;
pub mod state;
