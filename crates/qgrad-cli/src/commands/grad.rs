//! Grad command implementation.

use anyhow::Result;
use console::style;
use tracing::debug;

use qgrad_sim::BatchDriver;

use super::common::{Report, load_batch, load_config, merge_rejected, to_rows, write_report};

/// Execute the grad command.
#[allow(clippy::too_many_arguments)]
pub fn execute(
    input: &str,
    output: Option<&str>,
    config: Option<&str>,
    threads: Option<usize>,
    retention: Option<&str>,
    fused: bool,
    skip_failures: bool,
) -> Result<()> {
    let mut config = load_config(config, threads, retention, skip_failures)?;
    if fused {
        config.fuse_observables = true;
    }
    debug!(?config, "gradient configuration");

    let batch = load_batch(input, config.failure_policy)?;
    eprintln!(
        "{} Differentiating {} circuits over {} symbols",
        style("→").cyan().bold(),
        batch.entries.len(),
        batch.symbols.len()
    );

    let driver = BatchDriver::new(config)?;
    let out = driver.gradients(
        &batch.symbols,
        &batch.entries,
        batch.values.view(),
        batch.upstream.view(),
    )?;
    let out = merge_rejected(out, &batch.rejected);

    for failure in &out.failures {
        eprintln!(
            "  {} entry {}: {}",
            style("✗").red().bold(),
            failure.index,
            failure.message
        );
    }
    eprintln!("{} Gradients complete", style("✓").green().bold());

    let report = Report {
        symbols: batch.symbols.names(),
        gradients: Some(to_rows(&out.values)),
        expectations: None,
        failures: &out.failures,
    };
    write_report(&report, output)
}
