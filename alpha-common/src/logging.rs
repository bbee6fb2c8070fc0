//! Logging setup for the research binary.
//!
//! Two output shapes: human-readable lines for interactive runs and JSON
//! records (with span close events) for batch jobs. `RUST_LOG`, when set,
//! replaces the configured filter entirely.

use std::str::FromStr;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Dependency targets capped at `warn` regardless of the base level.
pub const NOISY_MODULES: &[&str] = &["tokio_util", "mio"];

/// Log output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Filter directives: base level, then `target=warn` for every noisy or
/// excluded target.
fn filter_directives(level: &str, excluded: &[String]) -> String {
    NOISY_MODULES
        .iter()
        .copied()
        .chain(excluded.iter().map(String::as_str))
        .fold(level.to_string(), |mut acc, target| {
            acc.push(',');
            acc.push_str(target);
            acc.push_str("=warn");
            acc
        })
}

/// Initialize the global subscriber. Later calls are no-ops.
pub fn init_logging(log_level: &str, log_format: &str) {
    init_logging_with_exclusions(log_level, log_format, &[]);
}

/// Like [`init_logging`], additionally capping `excluded_targets` at `warn`.
pub fn init_logging_with_exclusions(log_level: &str, log_format: &str, excluded_targets: &[String]) {
    let format = log_format.parse().unwrap_or(LogFormat::Pretty);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level, excluded_targets)));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_current_span(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_ansi(true).with_target(true))
            .try_init(),
    };

    if installed.is_ok() {
        tracing::info!(
            level = %log_level,
            format = ?format,
            capped_targets = NOISY_MODULES.len() + excluded_targets.len(),
            "Logging initialized"
        );
    }
}
