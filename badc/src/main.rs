//! # Main Entry Point
//!
//! Entry point of the `badc` driver. It is responsible for:
//! - Setting up panic handlers for improved error reporting.
//! - Loading the embedded default configuration.
//! - Parsing the command line, which also installs logging, and running the
//!   selected command.

#[cfg(not(debug_assertions))]
use human_panic::setup_panic;

#[cfg(debug_assertions)]
extern crate better_panic;

pub(crate) mod cli;

use bad::utils::app_config::AppConfig;
use bad::utils::error::Result;

/// The main entry point of the application.
///
/// Panic handlers come first: `human_panic` for release builds and
/// `better_panic` for debug builds. Errors are printed with their message,
/// not their debug form, and exit with status 1.
fn main() {
    // Human Panic. Only enabled when *not* debugging.
    #[cfg(not(debug_assertions))]
    {
        setup_panic!();
    }

    // Better Panic. Only enabled *when* debugging.
    #[cfg(debug_assertions)]
    {
        better_panic::Settings::debug()
            .most_recent_first(false)
            .lineno_suffix(true)
            .verbosity(better_panic::Verbosity::Full)
            .install();
    }

    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Loads the configuration embedded from `resources/default_config.toml`,
/// then parses the command line, since flags are merged on top of it.
fn run() -> Result<()> {
    // Initialize Configuration
    let config_contents = include_str!("resources/default_config.toml");
    AppConfig::init(Some(config_contents))?;

    // Match Commands
    crate::cli::cli_match()?;

    Ok(())
}
