//! folio CLI
//!
//! Builds a static site from a site root containing `site.yml`.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for folio.
#[derive(Parser)]
#[command(name = "folio", version, about = "A small static site generator")]
struct Cli {
    /// Site root containing site.yml
    #[arg(default_value = ".")]
    site: PathBuf,

    /// Delete and recreate the deploy directory before building
    #[arg(short = 'x', long)]
    clean: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(cli: &Cli) -> Result<()> {
    color_eyre::install()?;
    folio::init_tracing(cli.verbose);
    folio::cmd::build::run(&cli.site, cli.clean)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("error: {}", folio::error_line(&report));
            ExitCode::FAILURE
        }
    }
}
