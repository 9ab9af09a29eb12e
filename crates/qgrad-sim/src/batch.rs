//! Batch driver.
//!
//! Runs the adjoint engine (or the expectation evaluator) over a batch of
//! independent entries and assembles a `[batch, width]` output matrix. Each
//! entry owns its scratch buffers, so entries run in parallel without locks.

use ndarray::{Array2, ArrayView2};
use qgrad_ir::{Circuit, SymbolTable};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::adjoint::AdjointEngine;
use crate::config::{FailurePolicy, GradientConfig};
use crate::error::{SimError, SimResult};
use crate::expectation::expectations;
use crate::observable::PauliSum;

/// One batch row: a circuit and the observables it is scored against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// The circuit.
    pub circuit: Circuit,
    /// Observables, in upstream-column order.
    pub observables: Vec<PauliSum>,
}

impl BatchEntry {
    /// Create an entry.
    pub fn new(circuit: Circuit, observables: Vec<PauliSum>) -> Self {
        Self {
            circuit,
            observables,
        }
    }
}

/// A batch row that failed under [`FailurePolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryFailure {
    /// Row index.
    pub index: usize,
    /// Error message.
    pub message: String,
}

/// Assembled batch result.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutput {
    /// `[batch, width]` results; failed rows are zero.
    pub values: Array2<f64>,
    /// Rows that failed, ascending.
    pub failures: Vec<EntryFailure>,
}

/// Upstream gradient matrix with broadcasting.
///
/// One row broadcasts over the batch and one column over the observables.
/// Columns past an entry's observable count are padding and ignored.
struct Upstream<'a> {
    view: ArrayView2<'a, f64>,
}

impl<'a> Upstream<'a> {
    fn new(view: ArrayView2<'a, f64>, batch: usize, max_observables: usize) -> SimResult<Self> {
        let (rows, cols) = view.dim();
        let rows_ok = rows == batch || rows == 1;
        let cols_ok = cols == 1 || cols >= max_observables;
        if !rows_ok || !cols_ok {
            let expected_rows = if batch == 1 {
                "1".to_string()
            } else {
                format!("1 or {batch}")
            };
            return Err(SimError::Shape(format!(
                "upstream gradient is {rows}x{cols}, expected {expected_rows} rows \
                 and 1 or at least {max_observables} columns"
            )));
        }
        Ok(Self { view })
    }

    fn weights(&self, entry: usize, count: usize) -> Vec<f64> {
        let (rows, cols) = self.view.dim();
        let r = if rows == 1 { 0 } else { entry };
        (0..count)
            .map(|o| self.view[[r, if cols == 1 { 0 } else { o }]])
            .collect()
    }
}

/// Runs batches on the rayon pool.
#[derive(Debug)]
pub struct BatchDriver {
    config: GradientConfig,
    engine: AdjointEngine,
    pool: Option<ThreadPool>,
}

impl BatchDriver {
    /// Create a driver; builds a dedicated pool when `num_threads` is set.
    pub fn new(config: GradientConfig) -> SimResult<Self> {
        config.validate()?;
        let pool = match (config.parallel, config.num_threads) {
            (true, Some(n)) => Some(ThreadPoolBuilder::new().num_threads(n).build()?),
            _ => None,
        };
        Ok(Self {
            engine: AdjointEngine::from_config(&config),
            config,
            pool,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &GradientConfig {
        &self.config
    }

    /// Gradient tensor `[batch, num_symbols]`.
    ///
    /// Row `b` is `Σ_o upstream[b, o] · ∂⟨O_{b,o}⟩/∂s` evaluated at
    /// `values.row(b)`.
    #[instrument(skip_all, fields(batch = entries.len(), symbols = symbols.len()))]
    pub fn gradients(
        &self,
        symbols: &SymbolTable,
        entries: &[BatchEntry],
        values: ArrayView2<'_, f64>,
        upstream: ArrayView2<'_, f64>,
    ) -> SimResult<BatchOutput> {
        check_values(symbols, entries, values)?;
        let upstream = Upstream::new(upstream, entries.len(), max_observables(entries))?;
        let fused = self.config.fuse_observables;

        let rows = self.run_rows(entries.len(), |b| {
            let entry = &entries[b];
            let row = values.row(b).to_vec();
            let resolver = symbols.resolver(&row)?;
            let weights = upstream.weights(b, entry.observables.len());
            self.engine
                .gradients(&entry.circuit, &resolver, &entry.observables, &weights, fused)
        });

        let output = self.assemble(rows, symbols.len())?;
        info!(
            entries = entries.len(),
            failed = output.failures.len(),
            "gradient batch complete"
        );
        Ok(output)
    }

    /// Expectation tensor `[batch, max_observables]`, ragged rows padded with
    /// zero.
    #[instrument(skip_all, fields(batch = entries.len(), symbols = symbols.len()))]
    pub fn expectations(
        &self,
        symbols: &SymbolTable,
        entries: &[BatchEntry],
        values: ArrayView2<'_, f64>,
    ) -> SimResult<BatchOutput> {
        check_values(symbols, entries, values)?;
        let max_qubits = self.config.max_qubits;

        let rows = self.run_rows(entries.len(), |b| {
            let entry = &entries[b];
            let row = values.row(b).to_vec();
            let resolver = symbols.resolver(&row)?;
            expectations(&entry.circuit, &resolver, &entry.observables, max_qubits)
        });

        let output = self.assemble(rows, max_observables(entries))?;
        info!(
            entries = entries.len(),
            failed = output.failures.len(),
            "expectation batch complete"
        );
        Ok(output)
    }

    fn run_rows<F>(&self, len: usize, f: F) -> Vec<SimResult<Vec<f64>>>
    where
        F: Fn(usize) -> SimResult<Vec<f64>> + Sync + Send,
    {
        if !self.config.parallel {
            return (0..len).map(&f).collect();
        }
        match &self.pool {
            Some(pool) => pool.install(|| (0..len).into_par_iter().map(&f).collect()),
            None => (0..len).into_par_iter().map(&f).collect(),
        }
    }

    fn assemble(&self, rows: Vec<SimResult<Vec<f64>>>, width: usize) -> SimResult<BatchOutput> {
        let mut values = Array2::zeros((rows.len(), width));
        let mut failures = Vec::new();

        for (index, row) in rows.into_iter().enumerate() {
            match row {
                Ok(v) => {
                    for (dst, x) in values.row_mut(index).iter_mut().zip(v) {
                        *dst = x;
                    }
                }
                Err(e) => match self.config.failure_policy {
                    FailurePolicy::Abort => return Err(e.at_entry(index)),
                    FailurePolicy::Skip => {
                        warn!(index, error = %e, "batch entry failed; row left at zero");
                        failures.push(EntryFailure {
                            index,
                            message: e.to_string(),
                        });
                    }
                },
            }
        }
        Ok(BatchOutput { values, failures })
    }
}

fn max_observables(entries: &[BatchEntry]) -> usize {
    entries
        .iter()
        .map(|e| e.observables.len())
        .max()
        .unwrap_or(0)
}

fn check_values(
    symbols: &SymbolTable,
    entries: &[BatchEntry],
    values: ArrayView2<'_, f64>,
) -> SimResult<()> {
    let (rows, cols) = values.dim();
    if rows != entries.len() {
        return Err(SimError::Shape(format!(
            "{rows} parameter rows for {} circuits",
            entries.len()
        )));
    }
    if cols != symbols.len() {
        return Err(SimError::Shape(format!(
            "{cols} parameter columns for {} symbols",
            symbols.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_upstream_broadcast_shapes() {
        let scalar = array![[2.0]];
        let u = Upstream::new(scalar.view(), 3, 2).unwrap();
        assert_eq!(u.weights(2, 2), vec![2.0, 2.0]);

        let per_row = array![[1.0], [2.0]];
        let u = Upstream::new(per_row.view(), 2, 3).unwrap();
        assert_eq!(u.weights(1, 3), vec![2.0, 2.0, 2.0]);

        let padded = array![[1.0, 2.0, 3.0]];
        let u = Upstream::new(padded.view(), 4, 2).unwrap();
        assert_eq!(u.weights(3, 2), vec![1.0, 2.0]);
    }

    #[test]
    fn test_upstream_bad_shapes() {
        let narrow = array![[1.0, 2.0]];
        assert!(Upstream::new(narrow.view(), 1, 3).is_err());

        let tall = array![[1.0], [2.0], [3.0]];
        assert!(Upstream::new(tall.view(), 2, 1).is_err());

        let two_rows = array![[1.0], [2.0]];
        assert!(Upstream::new(two_rows.view(), 0, 0).is_err());
    }

    #[test]
    fn test_single_row_broadcasts_over_empty_batch() {
        let scalar = array![[1.0]];
        assert!(Upstream::new(scalar.view(), 0, 0).is_ok());
    }

    #[test]
    fn test_upstream_shape_message() {
        let tall = array![[1.0], [2.0], [3.0]];
        let Err(SimError::Shape(message)) = Upstream::new(tall.view(), 2, 1) else {
            panic!("expected a shape error");
        };
        assert_eq!(
            message,
            "upstream gradient is 3x1, expected 1 or 2 rows and 1 or at least 1 columns"
        );
    }

    #[test]
    fn test_zero_thread_pool_rejected() {
        let config = GradientConfig {
            num_threads: Some(0),
            ..GradientConfig::default()
        };
        assert!(matches!(
            BatchDriver::new(config),
            Err(SimError::ConfigInvalid(_))
        ));
    }
}
