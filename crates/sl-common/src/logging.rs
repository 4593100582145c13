//! Structured Logging Configuration
//!
//! - JSON output for production (`LOG_FORMAT=json` or `[logging] format = "json"`)
//! - Human-readable output for development (default)
//!
//! # Usage
//!
//! ```rust,ignore
//! use sl_common::logging::init_logging;
//!
//! fn main() {
//!     init_logging("sl-dev", None);
//!     tracing::info!(principal = %user, "Subscribed");
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `LOG_FORMAT`: "json" for JSON output, anything else for text. Only
//!   consulted when no format is passed explicitly.
//! - `RUST_LOG`: Standard log level filter (default: info)
//!   Examples: `RUST_LOG=debug`, `RUST_LOG=sl_ledger=trace`

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Parse a format name; anything other than "json" means text.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    /// Resolve from an explicit setting, falling back to `LOG_FORMAT`.
    pub fn resolve(configured: Option<&str>) -> Self {
        match configured {
            Some(value) if !value.trim().is_empty() => Self::parse(value),
            _ => Self::parse(&std::env::var("LOG_FORMAT").unwrap_or_default()),
        }
    }
}

/// Initialize logging for the given service.
///
/// Both formats write to stderr so stdout stays free for command output.
/// Reads RUST_LOG for level filtering (defaults to INFO).
pub fn init_logging(service_name: &str, configured_format: Option<&str>) {
    let env_filter = default_env_filter();

    match LogFormat::resolve(configured_format) {
        LogFormat::Json => init_json_logging(env_filter),
        LogFormat::Text => init_text_logging(env_filter),
    }

    tracing::debug!(service = service_name, "Logging initialized");
}

fn default_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize JSON logging for production.
fn init_json_logging(env_filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(false)
                .with_target(true)
                .flatten_event(true)
                .with_span_events(FmtSpan::CLOSE)
        )
        .init();
}

/// Initialize human-readable text logging for development.
fn init_text_logging(env_filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(true)
        )
        .init();
}
