//! Most recent user prompt from the transcript, shaped for a few terminal lines.

use crate::reverse_reader::read_last_lines;
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use statusline_types::TranscriptLine;
use std::path::Path;
use tracing::trace;

/// Transcript lines scanned for a user prompt. User turns are sparser than usage records.
pub const DEFAULT_WINDOW: usize = 200;

/// Tool-output wrappers the CLI injects as user-role records.
const SYSTEM_TAGS: &[&str] = &[
    "<local-command-stdout>",
    "<local-command-stderr>",
    "<bash-stdout>",
    "<bash-stderr>",
    "<bash-input>",
];

const CAVEAT_PREFIX: &str = "Caveat:";

static COMMAND_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<command-name>\s*([^<]*?)\s*</command-name>").expect("Invalid command-name regex")
});

/// Whether a user-role record was generated by the CLI rather than typed by the user.
pub fn is_system_message(content: &str) -> bool {
    let trimmed = content.trim();

    let json_payload = (trimmed.starts_with('[') && trimmed.ends_with(']'))
        || (trimmed.starts_with('{') && trimmed.ends_with('}'));
    if json_payload {
        return true;
    }

    if SYSTEM_TAGS.iter().any(|tag| content.contains(tag)) {
        return true;
    }

    trimmed.starts_with(CAVEAT_PREFIX)
}

/// Raw content of the newest prompt the user typed in `session_id`.
pub fn extract_user_message(
    transcript: Option<&Path>,
    session_id: &str,
    window: usize,
) -> Result<Option<String>> {
    let Some(path) = transcript.filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(None);
    };

    let lines = read_last_lines(path, window)?;
    for line in lines.iter().rev() {
        let Some(record) = TranscriptLine::parse(line) else {
            continue;
        };

        if record.is_sidechain() || record.session_id() != Some(session_id) {
            continue;
        }
        if record.entry_type() != Some("user") || record.role() != Some("user") {
            continue;
        }

        let Some(content) = record.content_text() else {
            continue;
        };
        if content.trim().is_empty() || is_system_message(content) {
            trace!(target: "statusline::transcript", "Skipping non-prompt user record");
            continue;
        }

        return Ok(Some(content.to_string()));
    }

    Ok(None)
}

/// Display limits for the message block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLimits {
    pub max_lines: usize,
    /// Characters per line, including the ellipsis when truncated.
    pub line_width: usize,
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self {
            max_lines: 3,
            line_width: 80,
        }
    }
}

/// A user prompt reduced to what fits under the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserMessage {
    /// A slash-command invocation, shown by name only.
    Command { name: String },
    Text {
        lines: Vec<String>,
        /// Lines dropped past `max_lines`.
        hidden_lines: usize,
        /// First line starts with `/`.
        command_style: bool,
    },
}

impl UserMessage {
    pub fn format(content: &str, limits: MessageLimits) -> Option<Self> {
        if let Some(caps) = COMMAND_NAME_RE.captures(content) {
            let name = caps[1].trim();
            if !name.is_empty() {
                let name = if name.starts_with('/') {
                    name.to_string()
                } else {
                    format!("/{name}")
                };
                return Some(UserMessage::Command { name });
            }
        }

        let content = content.trim();
        if content.is_empty() {
            return None;
        }

        let all: Vec<&str> = content.split('\n').collect();
        let command_style = all[0].trim_start().starts_with('/');
        let lines = all
            .iter()
            .take(limits.max_lines)
            .map(|line| truncate(line.trim(), limits.line_width))
            .collect();

        Some(UserMessage::Text {
            lines,
            hidden_lines: all.len().saturating_sub(limits.max_lines),
            command_style,
        })
    }
}

fn truncate(line: &str, width: usize) -> String {
    if line.chars().count() <= width {
        return line.to_string();
    }
    // Too narrow for an ellipsis: hard cut.
    if width < 3 {
        return line.chars().take(width).collect();
    }
    let kept: String = line.chars().take(width - 3).collect();
    format!("{kept}...")
}
