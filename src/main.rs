//! Main entry point for tartarus.

use clap::Parser;
use tartarus::cli::Cli;
use tartarus::utils::error_exit;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "tartarus=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    if let Err(e) = cli.execute() {
        error_exit(&e.to_string(), 1);
    }
}
