//! mongotask
//!
//! Runs the MongoDB database tools as build tasks.
//!
//! # Usage
//!
//! ```bash
//! # Single export
//! mongotask export --db mydb --collection mycol --type csv --fields name,email
//!
//! # Every task of a build file
//! mongotask run build.toml --keep-going
//! ```

use std::io::IsTerminal;

use clap::Parser;
use nu_ansi_term::Color;
use tracing::Level;

use mongotask::cli::{CliArgs, CliInterface};
use mongotask::error::Result;

/// Application entry point
fn main() {
    let args = CliArgs::parse();
    let color = !args.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(args) {
        let prefix = if color {
            Color::Red.bold().paint("Error:").to_string()
        } else {
            "Error:".to_string()
        };
        eprintln!("{} {}", prefix, e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Load configuration and merge it with the arguments
/// 2. Initialize logging
/// 3. Execute the selected subcommand
fn run(args: CliArgs) -> Result<()> {
    let cli = CliInterface::from_args(args)?;
    initialize_logging(&cli);
    cli.execute()
}

/// Initialize logging system based on configured level
///
/// Logs go to stderr so stdout carries only task messages and reports.
fn initialize_logging(cli: &CliInterface) {
    let level: Level = cli.config().logging.level.to_tracing_level();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(!cli.args().no_color)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
