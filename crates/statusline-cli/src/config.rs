//! Statusline configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use statusline_core::{
    AggregatorConfig, Layout, MessageLimits, RenderOptions, SeverityThresholds, TrackerConfig,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: PathBuf,
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
    #[serde(default = "default_write_debounce_secs")]
    pub write_debounce_secs: u64,
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: u64,
    #[serde(default = "default_context_warn_percent")]
    pub context_warn_percent: u8,
    #[serde(default = "default_context_critical_percent")]
    pub context_critical_percent: u8,
    #[serde(default = "default_progress_bar_width")]
    pub progress_bar_width: usize,
    #[serde(default = "default_git_cache_ttl_secs")]
    pub git_cache_ttl_secs: u64,
    #[serde(default = "default_git_timeout_ms")]
    pub git_timeout_ms: u64,
    #[serde(default = "default_transcript_window")]
    pub transcript_window: usize,
    #[serde(default = "default_user_message_window")]
    pub user_message_window: usize,
    #[serde(default = "default_message_max_lines")]
    pub message_max_lines: usize,
    #[serde(default = "default_message_line_width")]
    pub message_line_width: usize,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default = "default_colors")]
    pub colors: bool,
}

fn default_sessions_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".claude")
        .join("session-tracker")
        .join("sessions")
}

fn default_session_timeout_secs() -> u64 {
    600
}

fn default_write_debounce_secs() -> u64 {
    2
}

fn default_max_context_tokens() -> u64 {
    200_000
}

fn default_context_warn_percent() -> u8 {
    60
}

fn default_context_critical_percent() -> u8 {
    80
}

fn default_progress_bar_width() -> usize {
    10
}

fn default_git_cache_ttl_secs() -> u64 {
    5
}

fn default_git_timeout_ms() -> u64 {
    1500
}

fn default_transcript_window() -> usize {
    100
}

fn default_user_message_window() -> usize {
    200
}

fn default_message_max_lines() -> usize {
    3
}

fn default_message_line_width() -> usize {
    80
}

fn default_colors() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sessions_dir: default_sessions_dir(),
            session_timeout_secs: default_session_timeout_secs(),
            write_debounce_secs: default_write_debounce_secs(),
            max_context_tokens: default_max_context_tokens(),
            context_warn_percent: default_context_warn_percent(),
            context_critical_percent: default_context_critical_percent(),
            progress_bar_width: default_progress_bar_width(),
            git_cache_ttl_secs: default_git_cache_ttl_secs(),
            git_timeout_ms: default_git_timeout_ms(),
            transcript_window: default_transcript_window(),
            user_message_window: default_user_message_window(),
            message_max_lines: default_message_max_lines(),
            message_line_width: default_message_line_width(),
            layout: Layout::default(),
            colors: default_colors(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Load config from the default location or fall back to defaults.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Like [`Config::load`], but an unreadable or invalid default file only logs a warning.
    /// Only an explicitly requested config file may fail the render.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(target: "statusline::startup", "{:#}; using default configuration", e);
            Config::default()
        })
    }

    /// `<config dir>/statusline/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("statusline").join("config.toml"))
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            timeout: Duration::from_secs(self.session_timeout_secs),
            debounce: Duration::from_secs(self.write_debounce_secs),
        }
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            transcript_window: self.transcript_window,
            user_message_window: self.user_message_window,
            max_context_tokens: self.max_context_tokens,
            message_limits: MessageLimits {
                max_lines: self.message_max_lines,
                line_width: self.message_line_width,
            },
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            layout: self.layout,
            colors: self.colors,
            bar_width: self.progress_bar_width,
            thresholds: SeverityThresholds {
                warn_percent: self.context_warn_percent,
                critical_percent: self.context_critical_percent,
            },
        }
    }

    pub fn git_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.git_cache_ttl_secs)
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_millis(self.git_timeout_ms)
    }
}
