//! Expect command implementation.

use anyhow::Result;
use console::style;

use qgrad_sim::BatchDriver;

use super::common::{Report, load_batch, load_config, merge_rejected, to_rows, write_report};

/// Execute the expect command.
pub fn execute(
    input: &str,
    output: Option<&str>,
    config: Option<&str>,
    threads: Option<usize>,
    skip_failures: bool,
) -> Result<()> {
    let config = load_config(config, threads, None, skip_failures)?;
    let batch = load_batch(input, config.failure_policy)?;
    eprintln!(
        "{} Evaluating {} circuits",
        style("→").cyan().bold(),
        batch.entries.len()
    );

    let driver = BatchDriver::new(config)?;
    let out = driver.expectations(&batch.symbols, &batch.entries, batch.values.view())?;
    let out = merge_rejected(out, &batch.rejected);

    for failure in &out.failures {
        eprintln!(
            "  {} entry {}: {}",
            style("✗").red().bold(),
            failure.index,
            failure.message
        );
    }

    let report = Report {
        symbols: batch.symbols.names(),
        gradients: None,
        expectations: Some(to_rows(&out.values)),
        failures: &out.failures,
    };
    write_report(&report, output)
}
