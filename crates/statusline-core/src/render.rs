//! Text composition of the status block.

use crate::aggregator::StatusReport;
use crate::context::{format_tokens, Severity, SeverityThresholds};
use crate::user_message::UserMessage;
use owo_colors::OwoColorize;
use serde::Deserialize;
use statusline_types::DailySummary;
use std::fmt::Write;

/// A 24-bit terminal color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub mod palette {
    use super::Rgb;

    pub const GOLD: Rgb = Rgb(214, 196, 161);
    pub const CYAN: Rgb = Rgb(122, 162, 247);
    pub const PINK: Rgb = Rgb(247, 118, 142);
    pub const GREEN: Rgb = Rgb(158, 206, 106);
    pub const GRAY: Rgb = Rgb(86, 95, 137);
    pub const SILVER: Rgb = Rgb(192, 202, 245);
    pub const PURPLE: Rgb = Rgb(187, 154, 247);
    pub const YELLOW: Rgb = Rgb(224, 175, 104);

    pub const CONTEXT_NORMAL: Rgb = GREEN;
    pub const CONTEXT_ELEVATED: Rgb = YELLOW;
    pub const CONTEXT_CRITICAL: Rgb = PINK;
}

/// Model-name substrings and their colors, checked in order.
const MODEL_COLORS: &[(&str, Rgb)] = &[
    ("Opus", palette::GOLD),
    ("Sonnet", palette::CYAN),
    ("Haiku", palette::PINK),
    ("4", palette::PURPLE),
];

/// Where the user-message block goes relative to the two status lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    MessageFirst,
    #[default]
    MessageLast,
}

impl std::str::FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "message_first" | "first" => Ok(Layout::MessageFirst),
            "message_last" | "last" => Ok(Layout::MessageLast),
            _ => Err(format!(
                "Invalid layout: '{}'. Use 'message_first' or 'message_last'.",
                s
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub layout: Layout,
    pub colors: bool,
    pub bar_width: usize,
    pub thresholds: SeverityThresholds,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            colors: true,
            bar_width: 10,
            thresholds: SeverityThresholds::default(),
        }
    }
}

pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Full status block, newline-terminated.
    pub fn render(&self, report: &StatusReport) -> String {
        let message = report
            .user_message
            .as_ref()
            .map(|message| self.message_block(message));

        let mut out = String::new();
        if self.options.layout == Layout::MessageFirst {
            out.push_str(message.as_deref().unwrap_or_default());
        }
        out.push_str(&self.header_line(report));
        out.push('\n');
        out.push_str(&self.usage_line(report));
        out.push('\n');
        if self.options.layout == Layout::MessageLast {
            out.push_str(message.as_deref().unwrap_or_default());
        }
        out
    }

    fn paint(&self, text: &str, color: Rgb) -> String {
        if self.options.colors {
            text.truecolor(color.0, color.1, color.2).to_string()
        } else {
            text.to_string()
        }
    }

    fn header_line(&self, report: &StatusReport) -> String {
        let model = match model_color(&report.model) {
            Some(color) => self.paint(&report.model, color),
            None => report.model.clone(),
        };

        let mut line = format!(
            "[{}]  {}",
            model,
            self.paint(&report.project, palette::SILVER)
        );
        if !report.branch.is_empty() {
            let _ = write!(line, "  {}", self.paint(&report.branch, palette::YELLOW));
        }
        line
    }

    fn usage_line(&self, report: &StatusReport) -> String {
        let percent = report.context.percent();
        let color = severity_color(report.context.severity(self.options.thresholds));
        let gauge = format!("{}% ({})", percent, format_tokens(report.context.tokens));

        format!(
            "{} {} {} {}",
            self.progress_bar(percent, color),
            self.paint(&gauge, color),
            self.paint("│", palette::GRAY),
            self.paint(&format_daily(&report.today), palette::GREEN),
        )
    }

    fn progress_bar(&self, percent: u8, color: Rgb) -> String {
        let width = self.options.bar_width;
        let filled = (usize::from(percent) * width / 100).min(width);

        let mut bar = String::new();
        if filled > 0 {
            bar.push_str(&self.paint(&"█".repeat(filled), color));
        }
        if width > filled {
            bar.push_str(&self.paint(&"░".repeat(width - filled), palette::GRAY));
        }
        bar
    }

    fn message_block(&self, message: &UserMessage) -> String {
        let mut block = String::new();
        match message {
            UserMessage::Command { name } => {
                let _ = writeln!(block, "> {}", self.paint(name, palette::PURPLE));
            }
            UserMessage::Text {
                lines,
                hidden_lines,
                command_style,
            } => {
                let color = if *command_style {
                    palette::CYAN
                } else {
                    palette::GREEN
                };
                for line in lines {
                    let _ = writeln!(block, "> {}", self.paint(line, color));
                }
                if *hidden_lines > 0 {
                    let more = format!("... ({} more lines)", hidden_lines);
                    let _ = writeln!(block, "> {}", self.paint(&more, palette::GRAY));
                }
            }
        }
        block
    }
}

/// Color for a model display name, if one of the known families matches.
pub fn model_color(model: &str) -> Option<Rgb> {
    MODEL_COLORS
        .iter()
        .find(|(needle, _)| model.contains(needle))
        .map(|(_, color)| *color)
}

fn severity_color(severity: Severity) -> Rgb {
    match severity {
        Severity::Normal => palette::CONTEXT_NORMAL,
        Severity::Elevated => palette::CONTEXT_ELEVATED,
        Severity::Critical => palette::CONTEXT_CRITICAL,
    }
}

/// `1h5m`, `2h`, or `42m`.
pub fn format_duration(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;

    match (hours, minutes) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h{m}m"),
    }
}

/// Today's time, with a session count when several are active at once.
pub fn format_daily(summary: &DailySummary) -> String {
    let time = format_duration(summary.total_seconds);
    if summary.active_sessions > 1 {
        format!("{} [{} sessions]", time, summary.active_sessions)
    } else {
        time
    }
}
