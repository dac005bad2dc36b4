//! Context-window usage estimated from the transcript tail.

use crate::reverse_reader::read_last_lines;
use crate::Result;
use statusline_types::TranscriptLine;
use std::path::Path;
use tracing::trace;

/// Transcript lines scanned for a usage record.
pub const DEFAULT_WINDOW: usize = 100;
/// Context budget the percentage is computed against.
pub const DEFAULT_MAX_TOKENS: u64 = 200_000;

/// Tokens held in the context window according to the newest main-chain usage record.
///
/// `None` means the conversation has not started and reports zero.
pub fn context_tokens(transcript: Option<&Path>, window: usize) -> Result<u64> {
    let Some(path) = transcript.filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(0);
    };

    let lines = read_last_lines(path, window)?;
    for line in lines.iter().rev() {
        let Some(record) = TranscriptLine::parse(line) else {
            continue;
        };
        if record.is_sidechain() {
            continue;
        }

        if let Some(usage) = record.usage() {
            let tokens = usage.context_tokens();
            if tokens > 0 {
                trace!(target: "statusline::transcript", "Context usage: {} tokens", tokens);
                return Ok(tokens);
            }
        }
    }

    Ok(0)
}

/// Percentage thresholds for the three indicator bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityThresholds {
    /// At or above this the gauge is elevated.
    pub warn_percent: u8,
    /// At or above this the gauge is critical.
    pub critical_percent: u8,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            warn_percent: 60,
            critical_percent: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Elevated,
    Critical,
}

/// Token count measured against the model's context budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextUsage {
    pub tokens: u64,
    pub max_tokens: u64,
}

impl ContextUsage {
    pub fn new(tokens: u64, max_tokens: u64) -> Self {
        Self { tokens, max_tokens }
    }

    /// Rounded percentage of the budget, capped at 100.
    pub fn percent(&self) -> u8 {
        if self.max_tokens == 0 {
            return if self.tokens == 0 { 0 } else { 100 };
        }
        let percent = (self.tokens as f64 * 100.0 / self.max_tokens as f64).round();
        percent.min(100.0) as u8
    }

    pub fn severity(&self, thresholds: SeverityThresholds) -> Severity {
        let percent = self.percent();
        if percent < thresholds.warn_percent {
            Severity::Normal
        } else if percent < thresholds.critical_percent {
            Severity::Elevated
        } else {
            Severity::Critical
        }
    }
}

/// Abbreviate a token count with truncating `k`/`M` suffixes; zero renders as `--`.
pub fn format_tokens(tokens: u64) -> String {
    match tokens {
        0 => "--".to_string(),
        n if n >= 1_000_000 => format!("{}M", n / 1_000_000),
        n if n >= 1_000 => format!("{}k", n / 1_000),
        n => n.to_string(),
    }
}
