//! Ambient-stack testable properties: the daemon CLI's exit-code contract.
//! Only meaningful with the `cli` feature enabled.

#![cfg(feature = "cli")]

use clap::Parser;
use perftest::cli::Cli;

#[test]
fn help_exits_zero_and_mentions_start_daemon() {
    let err = Cli::try_parse_from(["perftest", "help"]).unwrap_err();
    assert!(!err.use_stderr());
    assert!(err.to_string().contains("start-daemon"));
}

#[test]
fn unknown_command_exits_nonzero() {
    let err = Cli::try_parse_from(["perftest", "bogus"]).unwrap_err();
    assert!(err.use_stderr());
}
