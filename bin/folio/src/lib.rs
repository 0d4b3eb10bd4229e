//! folio CLI library
//!
//! Command implementations and process setup for the `folio` binary.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! folio::cmd::build::run(Path::new("my-site"), false).unwrap();
//! ```

pub mod cmd;

use color_eyre::eyre::Report;
pub use folio_core::SiteConfig;
pub use folio_generator::{BuildStats, Builder};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

/// One-line description of a fatal error: the outermost context followed by
/// the error it wraps.
///
/// Library errors already embed their own causes in their message, so only
/// the first two links of the chain are printed.
pub fn error_line(report: &Report) -> String {
    let line = report
        .chain()
        .take(2)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ");
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}
