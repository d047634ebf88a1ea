//! # forkpatch CLI
//!
//! Binary entry point for the `forkpatch` command-line tool.
//!
//! Its responsibilities are:
//! - Parsing command-line arguments using `clap` (usage errors exit with 2).
//! - Executing the selected command.
//! - Reporting failures as `error[<Kind>]: <message>` on stderr and exiting
//!   with 1.
//!
//! The core logic lives in the `forkpatch` library crate; the binary is a thin
//! wrapper around it.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use forkpatch::output::OutputConfig;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let output = cli.output_config();

    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, &output);
            ExitCode::FAILURE
        }
    }
}

/// Print an error with its taxonomy kind and any causes not already shown.
fn report(err: &anyhow::Error, output: &OutputConfig) {
    let kind = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<forkpatch::Error>())
        .map(forkpatch::Error::kind)
        .unwrap_or("IOError");

    let message = err.to_string();
    eprintln!("{}: {}", output.error_label(kind), message);
    for cause in err.chain().skip(1) {
        let cause = cause.to_string();
        if !message.contains(&cause) {
            eprintln!("  caused by: {}", cause);
        }
    }
}
