//! Build command - generates the static site

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use folio_generator::Builder;

/// Run the build command.
///
/// Builds the site rooted at `site` into its deploy directory.
pub fn run(site: &Path, clean: bool) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?site, clean, "Starting build");

    let stats = Builder::new(site)
        .with_clean(clean)
        .build()
        .wrap_err_with(|| format!("failed to build {}", site.display()))?;

    let duration = start.elapsed();

    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Pages:    {}", stats.pages);
    println!("  Archives: {}", stats.archives);
    println!("  Assets:   {} ({} up to date)", stats.assets, stats.assets_skipped);
    println!();
    println!("  Duration: {:.2}s", duration.as_secs_f64());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(())
}
