//! Offline bundler CLI entrypoint.
//!
//! Fetches offline dependencies and packages self-contained opencode
//! bundles. Progress is written to stderr; diagnostic logging is controlled
//! with `RUST_LOG`.

use clap::Parser;
use offline_bundler::cli::Cli;
use offline_bundler::error::Result;
use offline_bundler::output::error_report;
use offline_bundler::pipeline::{Collaborators, run};
use std::io::Write;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, Collaborators::system(), &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Install the fmt subscriber; `log` records reach it through the
/// `tracing-log` bridge. An already installed subscriber is kept.
fn init_logging(quiet: bool) {
    let default_level = if quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
    {
        log::debug!("keeping the already installed subscriber: {err}");
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            offline_bundler::output::write_stderr_line(stderr, error_report(&err));
            1
        }
    }
}
