mod api;
mod cli;
mod config;
mod dispatch;
mod error;
mod model;
mod remote;
mod resolve;
mod session;
mod template;
mod vars;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use error::Error;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose, cli.debug);

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Cancelled) => {
            eprintln!("Cancelled.");
            ExitCode::from(Error::Cancelled.exit_code())
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Logs go to stderr so stdout stays clean for results.
fn init_tracing(verbose: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
