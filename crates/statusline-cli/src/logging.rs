//! Logging setup for the `statusline` binary.
//!
//! Stdout carries the status block, so every log line goes to stderr. Verbosity comes from a
//! preset chosen by the CLI flags, refined by `--log target=level` overrides. `RUST_LOG`, when
//! set, replaces both.

use std::collections::BTreeMap;
use tracing::{Dispatch, Level};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const TARGET_ROOT: &str = "statusline";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event. Spans are reported when they close, with their timing.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("text") {
            Ok(LogFormat::Text)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else {
            Err(format!("Invalid log format: '{}'. Use 'text' or 'json'.", s))
        }
    }
}

/// Baseline verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Warnings only; a healthy render prints nothing to stderr.
    #[default]
    Production,
    /// Session writes and git lookups.
    Verbose,
    Debug,
    /// Includes per-line transcript decisions.
    Trace,
    Quiet,
}

impl LogPreset {
    /// The most specific flag wins: quiet, then trace, debug, verbose.
    pub fn from_flags(verbose: bool, debug: bool, trace: bool, quiet: bool) -> Self {
        match (quiet, trace, debug, verbose) {
            (true, ..) => LogPreset::Quiet,
            (_, true, ..) => LogPreset::Trace,
            (_, _, true, _) => LogPreset::Debug,
            (_, _, _, true) => LogPreset::Verbose,
            _ => LogPreset::Production,
        }
    }

    fn directives(self) -> &'static [&'static str] {
        match self {
            LogPreset::Production => &["warn"],
            LogPreset::Verbose => &[
                "warn",
                "statusline=info",
                "statusline::session=debug",
                "statusline::git=debug",
            ],
            LogPreset::Debug => &["warn", "statusline=debug"],
            LogPreset::Trace => &["info", "statusline=trace"],
            LogPreset::Quiet => &["error"],
        }
    }
}

/// Resolved logging options.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Full target name to level, e.g. `statusline::git` -> DEBUG.
    pub overrides: BTreeMap<String, Level>,
    pub format: LogFormat,
}

impl LogConfig {
    pub fn from_cli(
        verbose: bool,
        debug: bool,
        trace: bool,
        quiet: bool,
        log_overrides: Vec<String>,
        format: LogFormat,
    ) -> Self {
        Self {
            preset: LogPreset::from_flags(verbose, debug, trace, quiet),
            overrides: parse_overrides(&log_overrides),
            format,
        }
    }

    /// `RUST_LOG` if set, otherwise the preset followed by the overrides.
    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }

        let directives = self
            .preset
            .directives()
            .iter()
            .map(|d| d.to_string())
            .chain(
                self.overrides
                    .iter()
                    .map(|(target, level)| format!("{}={}", target, level)),
            )
            .collect::<Vec<_>>()
            .join(",");

        EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("warn"))
    }

    /// A dispatcher that writes to `writer`.
    pub fn dispatch<W>(&self, writer: W) -> Dispatch
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let registry = tracing_subscriber::registry().with(self.build_filter());
        match self.format {
            LogFormat::Text => Dispatch::new(
                registry.with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_target(true)
                        .without_time(),
                ),
            ),
            LogFormat::Json => Dispatch::new(
                registry.with(
                    fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                ),
            ),
        }
    }
}

/// Parse `target=level` entries, comma-separated or repeated. Short targets are placed under
/// `statusline::`; entries with an unknown level are dropped.
fn parse_overrides(raw: &[String]) -> BTreeMap<String, Level> {
    raw.iter()
        .flat_map(|entry| entry.split(','))
        .filter_map(|part| {
            let (target, level) = part.split_once('=')?;
            let level = level.trim().parse::<Level>().ok()?;
            let target = target.trim();
            let target = if target == TARGET_ROOT || target.starts_with("statusline::") {
                target.to_string()
            } else {
                format!("{}::{}", TARGET_ROOT, target)
            };
            Some((target, level))
        })
        .collect()
}

/// Install the global subscriber, logging to stderr.
pub fn init(config: &LogConfig) {
    config.dispatch(std::io::stderr).init();
}
