//! Daemon configuration.

use crate::observability::LogLevel;

/// Configuration for bringing up the IPC server side of the daemon.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// The discovery token negotiated out-of-band with the client.
    pub token: String,
    /// Tracing severity filter for the default subscriber.
    pub log_level: LogLevel,
}

impl DaemonConfig {
    /// Builds a config for the given token at the default log level.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            log_level: LogLevel::default(),
        }
    }

    /// Sets the log level, builder-style.
    #[must_use]
    pub const fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_level_is_info() {
        let cfg = DaemonConfig::new("tok");
        assert_eq!(cfg.log_level, LogLevel::Info);
    }
}
