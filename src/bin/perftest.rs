//! Thin entry point for the `perftest` daemon CLI; all argument parsing and
//! command dispatch lives in [`perftest::cli`].

use std::process::ExitCode;

fn main() -> ExitCode {
    let code = perftest::cli::Cli::run(std::env::args_os());
    ExitCode::from(code as u8)
}
