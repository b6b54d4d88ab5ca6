//! Report command implementation

use anyhow::Result;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::aggregator::Aggregator;
use crate::config::Config;
use crate::output::{self, OutputFormat};
use crate::platform::DEFAULT_KUBERNETES_VERSIONING;
use crate::resolve::Resolver;

/// Options for a report run
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Inventory document
    pub config: PathBuf,
    /// Repository root that inventory paths are relative to
    pub root: PathBuf,
    pub format: OutputFormat,
}

/// Resolve the inventory against the repository and print the report to stdout
///
/// Returns whether every occurrence resolved.
pub fn run(options: ReportOptions) -> Result<bool> {
    crate::log_info!("Repository root: {}", options.root.display());
    crate::log_info!(
        "Platform default Kubernetes version: v{}",
        DEFAULT_KUBERNETES_VERSIONING.default
    );

    let resolver = Resolver::for_repository(&options.root);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    report(&options.config, resolver, options.format, &mut out)
}

/// Load, resolve and render one inventory
///
/// Inventory errors abort before anything is written. Occurrences that fail
/// to resolve are reported as `?` and make the result `false`.
pub fn report<W: Write>(
    config_path: &Path,
    resolver: Resolver,
    format: OutputFormat,
    out: &mut W,
) -> Result<bool> {
    let config = Config::load(config_path)?;

    let mut aggregator = Aggregator::new(resolver);
    let mut report = aggregator.run(config);

    output::render(&mut report.config, format, out)?;

    if !report.is_success() {
        crate::log_warn!("{} occurrence(s) failed to resolve", report.failed);
    }

    Ok(report.is_success())
}
