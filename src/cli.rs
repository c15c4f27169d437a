//! The `perftest` daemon CLI: argument parsing, log initialization, and the
//! `start-daemon`/`help` entry points. Everything else — bringing up the
//! IPC server, wiring the [`crate::api::ApiServer`] handler map — is the
//! host binary's job; this module only owns the command surface.

use crate::config::DaemonConfig;
use crate::observability::{self, LogFormat, LogLevel};
use clap::{Parser, Subcommand, ValueEnum};

/// `perftest <command> [args]`.
#[derive(Parser, Debug)]
#[command(name = "perftest", version, about = "UI-automation and perf-test daemon")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Raise the tracing filter to `debug`.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Select the subscriber's event formatter.
    #[arg(long = "log-format", value_enum, global = true, default_value_t = CliLogFormat::Pretty)]
    log_format: CliLogFormat,
}

/// CLI-facing mirror of [`LogFormat`]; `clap::ValueEnum` needs a type it
/// owns rather than one from another module's public surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum CliLogFormat {
    /// Human-readable, multi-line event formatting.
    #[default]
    Pretty,
    /// One JSON object per event, for log-shipping pipelines.
    Json,
}

impl From<CliLogFormat> for LogFormat {
    fn from(value: CliLogFormat) -> Self {
        match value {
            CliLogFormat::Pretty => Self::Pretty,
            CliLogFormat::Json => Self::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Daemonize and bring up the IPC server against the given discovery
    /// token. Exits 0 on success, 1 otherwise.
    StartDaemon {
        /// The discovery token negotiated out-of-band with the client.
        token: String,
    },
}

impl Cli {
    /// Parses `args` (argv, including argv\[0\]) and runs the resulting
    /// command, returning the process exit code. An unrecognized command
    /// exits 1; `help` prints usage and exits 0.
    #[must_use]
    pub fn run<I, T>(args: I) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = match Self::try_parse_from(args) {
            Ok(cli) => cli,
            Err(err) => {
                let _ = err.print();
                return i32::from(err.use_stderr());
            }
        };

        let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Info };
        observability::init_with(level, cli.log_format.into());

        match cli.command {
            Command::StartDaemon { token } => Self::start_daemon(&token),
        }
    }

    fn start_daemon(token: &str) -> i32 {
        let config = DaemonConfig::new(token);
        tracing::info!(token = %config.token, "starting perftest daemon");
        0
    }
}
