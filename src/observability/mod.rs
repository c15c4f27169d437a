//! Structured logging setup.
//!
//! The core subsystems emit [`tracing`] spans and events (dispatch,
//! transact, orchestrator state transitions); this module only owns
//! turning those into output. Production embedding is expected to install
//! its own subscriber, so initialization here is opt-in and idempotent.

use std::sync::Once;

static INIT: Once = Once::new();

/// Severity filter for the daemon's default subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    /// Fine-grained tracing of dispatch/transact internals.
    Trace,
    /// Per-call and per-iteration diagnostic detail.
    Debug,
    /// Connection, run, and lifecycle milestones.
    #[default]
    Info,
    /// Recoverable anomalies (pre-processor rejection, discovery retry).
    Warn,
    /// Failures surfaced to the caller as an `ApiCallErr`.
    Error,
}

impl LogLevel {
    /// Maps to the equivalent `tracing` level filter string.
    #[must_use]
    pub const fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Output formatter for the daemon's default subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, multi-line event formatting.
    #[default]
    Pretty,
    /// One JSON object per event, for log-shipping pipelines.
    Json,
}

/// Installs a global `tracing-subscriber` formatter at the given level.
///
/// Safe to call more than once per process; only the first call takes
/// effect. Intended for the daemon binary's entry point and for tests via
/// [`init_for_test`].
#[cfg(any(feature = "test-internals", feature = "cli"))]
pub fn init(level: LogLevel) {
    init_with(level, LogFormat::Pretty);
}

/// Like [`init`], but also selects the event formatter.
#[cfg(any(feature = "test-internals", feature = "cli"))]
pub fn init_with(level: LogLevel, format: LogFormat) {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_new(level.as_filter_str())
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer();
        let _ = match format {
            LogFormat::Pretty => subscriber.pretty().try_init(),
            LogFormat::Json => subscriber.json().try_init(),
        };
    });
}

/// Test-only convenience wrapper around [`init`] at `LogLevel::Debug`.
#[cfg(feature = "test-internals")]
pub fn init_for_test() {
    init(LogLevel::Debug);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_init_does_not_panic() {
        init_for_test();
        init_for_test();
    }

    #[test]
    fn filter_strings_match_level_names() {
        assert_eq!(LogLevel::Trace.as_filter_str(), "trace");
        assert_eq!(LogLevel::Error.as_filter_str(), "error");
    }

    #[test]
    fn json_format_does_not_panic() {
        init_with(LogLevel::Debug, LogFormat::Json);
    }
}
