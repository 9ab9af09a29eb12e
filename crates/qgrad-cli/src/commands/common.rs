//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use qgrad_ir::{Circuit, SymbolTable};
use qgrad_sim::{
    BatchEntry, BatchOutput, EntryFailure, FailurePolicy, GradientConfig, PauliSum, Retention,
    SimError,
};

/// Batch input file.
///
/// ```json
/// {
///   "symbols": ["alpha", "beta"],
///   "entries": [
///     {"circuit": {...}, "values": [0.1, 0.2], "observables": [{"terms": [...]}]}
///   ],
///   "upstream": [[1.0]]
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct BatchFile {
    /// Symbol column order.
    pub symbols: Vec<String>,
    /// One circuit per row.
    pub entries: Vec<FileEntry>,
    /// Upstream gradient, `[1 | batch, 1 | >= max observables]`; defaults to `[[1.0]]`.
    #[serde(default)]
    pub upstream: Option<Vec<Vec<f64>>>,
}

/// One row of a [`BatchFile`].
#[derive(Debug, Deserialize)]
pub struct FileEntry {
    pub circuit: Circuit,
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default)]
    pub observables: Vec<PauliSum>,
}

/// A batch file converted to driver inputs.
pub struct LoadedBatch {
    pub symbols: SymbolTable,
    pub entries: Vec<BatchEntry>,
    pub values: Array2<f64>,
    pub upstream: Array2<f64>,
    /// Rows whose value count did not match the symbol table. Their values
    /// row is zero and their output row must be discarded.
    pub rejected: Vec<EntryFailure>,
}

/// Load and convert a JSON batch file.
pub fn load_batch(path: &str, policy: FailurePolicy) -> Result<LoadedBatch> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    let file: BatchFile =
        serde_json::from_str(&source).with_context(|| format!("Invalid batch file: {path}"))?;
    into_batch(file, policy)
}

/// Convert a parsed batch file.
///
/// A values row of the wrong length fails only its entry: under
/// [`FailurePolicy::Abort`] the whole conversion fails with that entry's
/// index, under [`FailurePolicy::Skip`] the row is zero-filled and recorded in
/// [`LoadedBatch::rejected`].
pub fn into_batch(file: BatchFile, policy: FailurePolicy) -> Result<LoadedBatch> {
    let symbols = SymbolTable::new(file.symbols)?;

    let mut rejected = Vec::new();
    let mut rows = Vec::with_capacity(file.entries.len());
    for (index, entry) in file.entries.iter().enumerate() {
        if entry.values.len() == symbols.len() {
            rows.push(entry.values.clone());
            continue;
        }
        let err = SimError::Shape(format!(
            "{} values for {} symbols",
            entry.values.len(),
            symbols.len()
        ))
        .at_entry(index);
        match policy {
            FailurePolicy::Abort => return Err(err.into()),
            FailurePolicy::Skip => {
                warn!(index, error = %err, "batch entry rejected; row left at zero");
                rejected.push(EntryFailure {
                    index,
                    message: err.to_string(),
                });
                rows.push(vec![0.0; symbols.len()]);
            }
        }
    }
    let values = to_matrix(&rows, symbols.len(), "values")?;

    let upstream = file.upstream.unwrap_or_else(|| vec![vec![1.0]]);
    let width = upstream.first().map_or(0, Vec::len);
    let upstream = to_matrix(&upstream, width, "upstream")?;

    let entries = file
        .entries
        .into_iter()
        .map(|e| BatchEntry::new(e.circuit, e.observables))
        .collect();

    Ok(LoadedBatch {
        symbols,
        entries,
        values,
        upstream,
        rejected,
    })
}

/// Fold rows rejected at load time into the driver's output: their rows are
/// zeroed and their failures replace any the driver reported for them.
pub fn merge_rejected(mut out: BatchOutput, rejected: &[EntryFailure]) -> BatchOutput {
    if rejected.is_empty() {
        return out;
    }
    for failure in rejected {
        out.values.row_mut(failure.index).fill(0.0);
    }
    out.failures.retain(|f| !rejected.iter().any(|r| r.index == f.index));
    out.failures.extend_from_slice(rejected);
    out.failures.sort_by_key(|f| f.index);
    out
}

/// Pack rows of equal length into a matrix.
pub fn to_matrix(rows: &[Vec<f64>], cols: usize, what: &str) -> Result<Array2<f64>> {
    for (i, row) in rows.iter().enumerate() {
        if row.len() != cols {
            anyhow::bail!("{what} row {i} has {} entries, expected {cols}", row.len());
        }
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), cols), flat)
        .with_context(|| format!("Failed to shape {what}"))
}

/// Matrix rows as nested vectors for JSON output.
pub fn to_rows(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.rows().into_iter().map(|r| r.to_vec()).collect()
}

/// Resolve engine settings: config file and `QGRAD_*` variables, then CLI flags.
pub fn load_config(
    path: Option<&str>,
    threads: Option<usize>,
    retention: Option<&str>,
    skip_failures: bool,
) -> Result<GradientConfig> {
    let mut config = GradientConfig::load(path.map(Path::new))
        .with_context(|| format!("Failed to load config: {}", path.unwrap_or("<defaults>")))?;
    if let Some(n) = threads {
        config.num_threads = Some(n);
    }
    if let Some(r) = retention {
        config.retention = parse_retention(r)?;
    }
    if skip_failures {
        config.failure_policy = FailurePolicy::Skip;
    }
    config.validate()?;
    Ok(config)
}

/// Parse a retention strategy name.
pub fn parse_retention(name: &str) -> Result<Retention> {
    match name.to_lowercase().as_str() {
        "recompute" => Ok(Retention::Recompute),
        "cache" => Ok(Retention::Cache),
        other => anyhow::bail!("Unknown retention: '{other}'. Available: recompute, cache"),
    }
}

/// JSON result written by `grad` and `expect`.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub symbols: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradients: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expectations: Option<Vec<Vec<f64>>>,
    pub failures: &'a [EntryFailure],
}

/// Write `report` as pretty JSON to `output`, or stdout.
pub fn write_report(report: &Report<'_>, output: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write file: {path}"))?;
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_ENTRIES: &str = r#"{
        "symbols": ["alpha", "beta"],
        "entries": [
            {
                "circuit": {
                    "name": "xy_cnot",
                    "num_qubits": 2,
                    "instructions": [
                        {"gate": "x_pow", "params": [{"Symbol": "alpha"}], "qubits": [0]},
                        {"gate": "y_pow", "params": [{"Symbol": "beta"}], "qubits": [1]},
                        {"gate": "CNP", "params": [{"Constant": 1.0}], "qubits": [0, 1]}
                    ]
                },
                "values": [0.123, 0.456],
                "observables": [
                    {"terms": [{"coeff": 1.0, "pauli": {"ops": [[0, "Z"]]}}]},
                    {"terms": [{"coeff": 1.0, "pauli": {"ops": [[1, "X"]]}}]}
                ]
            },
            {
                "circuit": {"name": "idle", "num_qubits": 1},
                "values": VALUES_ROW_1,
                "observables": [{"terms": [{"coeff": 1.0, "pauli": {"ops": [[0, "Z"]]}}]}]
            }
        ]UPSTREAM
    }"#;

    fn batch_file(values_row_1: &str, upstream: &str) -> BatchFile {
        let json = TWO_ENTRIES
            .replace("VALUES_ROW_1", values_row_1)
            .replace("UPSTREAM", upstream);
        serde_json::from_str(&json).unwrap()
    }

    fn gradients(batch: &LoadedBatch, policy: FailurePolicy) -> BatchOutput {
        let driver = qgrad_sim::BatchDriver::new(GradientConfig {
            parallel: false,
            failure_policy: policy,
            ..GradientConfig::default()
        })
        .unwrap();
        let out = driver
            .gradients(
                &batch.symbols,
                &batch.entries,
                batch.values.view(),
                batch.upstream.view(),
            )
            .unwrap();
        merge_rejected(out, &batch.rejected)
    }

    // -------------------------------------------------------------------------
    // Upstream
    // -------------------------------------------------------------------------

    #[test]
    fn test_upstream_defaults_to_scalar_one() {
        let batch = into_batch(batch_file("[0.0, 0.0]", ""), FailurePolicy::Abort).unwrap();
        assert_eq!(batch.upstream, ndarray::array![[1.0]]);

        let out = gradients(&batch, FailurePolicy::Abort);
        assert!((out.values[[0, 0]] + 1.18398).abs() < 1e-3);
        assert!((out.values[[0, 1]] - 0.43288).abs() < 1e-3);
    }

    #[test]
    fn test_upstream_width_from_first_row() {
        let file = batch_file("[0.0, 0.0]", r#", "upstream": [[1.0, 2.0], [3.0, 4.0]]"#);
        let batch = into_batch(file, FailurePolicy::Abort).unwrap();
        assert_eq!(batch.upstream.dim(), (2, 2));
        assert_eq!(batch.upstream[[1, 0]], 3.0);
    }

    #[test]
    fn test_ragged_upstream_rejected() {
        let file = batch_file("[0.0, 0.0]", r#", "upstream": [[1.0, 2.0], [3.0]]"#);
        let err = into_batch(file, FailurePolicy::Skip).err().unwrap();
        assert!(err.to_string().contains("upstream row 1 has 1 entries, expected 2"));
    }

    #[test]
    fn test_empty_batch_uses_default_upstream() {
        let json = r#"{"symbols": ["a"], "entries": []}"#;
        let file: BatchFile = serde_json::from_str(json).unwrap();
        let batch = into_batch(file, FailurePolicy::Abort).unwrap();
        let out = gradients(&batch, FailurePolicy::Abort);
        assert_eq!(out.values.dim(), (0, 1));
    }

    // -------------------------------------------------------------------------
    // Per-entry value rows
    // -------------------------------------------------------------------------

    #[test]
    fn test_short_values_row_aborts_with_index() {
        let err = into_batch(batch_file("[0.3]", ""), FailurePolicy::Abort)
            .err()
            .unwrap();
        match err.downcast_ref::<SimError>() {
            Some(SimError::Entry { index, source }) => {
                assert_eq!(*index, 1);
                assert!(matches!(**source, SimError::Shape(_)));
            }
            other => panic!("expected entry error, got {other:?}"),
        }
    }

    #[test]
    fn test_long_values_row_skipped() {
        let batch = into_batch(batch_file("[0.3, 9.9, 1.0]", ""), FailurePolicy::Skip).unwrap();
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].index, 1);
        assert!(batch.rejected[0].message.contains("3 values for 2 symbols"));

        let out = gradients(&batch, FailurePolicy::Skip);
        assert_eq!(out.values.dim(), (2, 2));
        assert!((out.values[[0, 0]] + 1.18398).abs() < 1e-3);
        assert!(out.values.row(1).iter().all(|&v| v == 0.0));
        assert_eq!(out.failures, batch.rejected);
    }

    #[test]
    fn test_merge_replaces_driver_failure_for_rejected_row() {
        let mut out = BatchOutput {
            values: ndarray::array![[1.0], [2.0], [3.0]],
            failures: vec![
                EntryFailure {
                    index: 1,
                    message: "driver".into(),
                },
                EntryFailure {
                    index: 2,
                    message: "driver".into(),
                },
            ],
        };
        let rejected = [EntryFailure {
            index: 1,
            message: "loader".into(),
        }];
        out = merge_rejected(out, &rejected);
        assert_eq!(out.values, ndarray::array![[1.0], [0.0], [3.0]]);
        let indexed: Vec<_> = out
            .failures
            .iter()
            .map(|f| (f.index, f.message.as_str()))
            .collect();
        assert_eq!(indexed, vec![(1, "loader"), (2, "driver")]);
    }

    #[test]
    fn test_unknown_gate_rejected() {
        let json = TWO_ENTRIES
            .replace("VALUES_ROW_1", "[]")
            .replace("UPSTREAM", "")
            .replace(r#""gate": "x_pow""#, r#""gate": "toffoli""#);
        assert!(serde_json::from_str::<BatchFile>(&json).is_err());
    }

    #[test]
    fn test_out_of_range_qubit_rejected() {
        let json = TWO_ENTRIES
            .replace("VALUES_ROW_1", "[]")
            .replace("UPSTREAM", "")
            .replace(r#""qubits": [1]"#, r#""qubits": [7]"#);
        assert!(serde_json::from_str::<BatchFile>(&json).is_err());
    }

    #[test]
    fn test_load_batch_missing_file() {
        let err = load_batch("/nonexistent/batch.json", FailurePolicy::Abort)
            .err()
            .unwrap();
        assert!(err.to_string().contains("File not found"));
    }

    // -------------------------------------------------------------------------
    // Config precedence
    // -------------------------------------------------------------------------

    fn config_file(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{text}").unwrap();
        file
    }

    #[test]
    fn test_file_values_kept_without_flags() {
        let file = config_file("parallel: false\nfuse_observables: true\nfailure_policy: skip\n");
        let config = load_config(file.path().to_str(), None, None, false).unwrap();
        assert!(!config.parallel);
        assert!(config.fuse_observables);
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
    }

    #[test]
    fn test_flags_override_file() {
        let file = config_file("num_threads: 2\nretention: recompute\n");
        let config = load_config(file.path().to_str(), Some(5), Some("Cache"), true).unwrap();
        assert_eq!(config.num_threads, Some(5));
        assert_eq!(config.retention, Retention::Cache);
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
    }

    #[test]
    fn test_flags_are_validated() {
        assert!(load_config(None, Some(0), None, false).is_err());
        let err = load_config(None, None, Some("sometimes"), false).unwrap_err();
        assert!(err.to_string().contains("Unknown retention"));
    }

    // -------------------------------------------------------------------------
    // Report
    // -------------------------------------------------------------------------

    #[test]
    fn test_write_report_to_file() {
        let symbols = vec!["a".to_string(), "b".to_string()];
        let failures = vec![EntryFailure {
            index: 1,
            message: "bad".into(),
        }];
        let report = Report {
            symbols: &symbols,
            gradients: Some(vec![vec![0.5, -1.0], vec![0.0, 0.0]]),
            expectations: None,
            failures: &failures,
        };
        let out = tempfile::NamedTempFile::new().unwrap();
        let path = out.path().to_str().unwrap();
        write_report(&report, Some(path)).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["symbols"], serde_json::json!(["a", "b"]));
        assert_eq!(json["gradients"][0][1], -1.0);
        assert!(json.get("expectations").is_none());
        assert_eq!(json["failures"][0]["index"], 1);
    }
}
