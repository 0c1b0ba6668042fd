//! # Structured Logging
//!
//! `presentproof-node` keeps its two output streams apart:
//!
//! - **stdout** carries exactly one thing, the JSON run report, so it can be
//!   piped straight into `jq` or a test harness.
//! - **stderr** carries the `tracing` events of both agents: one `debug`
//!   line per state transition, `info` when a conversation comes to rest or
//!   is abandoned, `warn` for the step that caused an abandon.
//!
//! In JSON mode every line also carries the `msg_type` field of the
//! service span it was emitted under, which is enough to follow a single
//! message through a batch of concurrent conversations.
//!
//! `RUST_LOG` overrides the filter given on the command line.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, colored output.
    Pretty,
    /// JSON lines, one event per line.
    Json,
}

impl LogFormat {
    /// Parse a format string. Accepts "json" or "pretty" (case-insensitive).
    /// Returns `Pretty` for any unrecognized value.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// The filter to install: `RUST_LOG` when set and valid, else
/// `default_level`, else `info` if that does not parse either.
fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber, writing to stderr.
///
/// Call this exactly once, before the agents are started.
pub fn init_logging(default_level: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(filter(default_level));

    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .init(),
    }

    tracing::debug!(?format, "logging initialized");
}
