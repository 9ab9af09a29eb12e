//! Engine configuration.
//!
//! Loaded from a YAML file, then overridden by environment variables with the
//! `QGRAD_` prefix:
//!
//! ```yaml
//! parallel: true
//! num_threads: 8
//! max_qubits: 24
//! retention: cache
//! fuse_observables: false
//! failure_policy: skip
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SimError, SimResult};

/// How the reverse sweep obtains the state before each gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retention {
    /// Un-apply each gate from the final state during the sweep. O(2^N) memory.
    #[default]
    Recompute,
    /// Keep every pre-gate state from the forward pass. O(G·2^N) memory.
    Cache,
}

/// What the batch driver does when one entry fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole batch with the first failing entry.
    #[default]
    Abort,
    /// Leave the failing row at zero and report it.
    Skip,
}

/// Gradient engine and batch driver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientConfig {
    /// Parallelize across batch entries.
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Size of a dedicated worker pool; `None` uses the global pool.
    #[serde(default)]
    pub num_threads: Option<usize>,

    /// Circuits wider than this are rejected before any allocation.
    #[serde(default = "default_max_qubits")]
    pub max_qubits: u32,

    /// Pre-gate state strategy for the reverse sweep.
    #[serde(default)]
    pub retention: Retention,

    /// Sweep once per entry with a weighted co-state instead of once per
    /// observable.
    #[serde(default)]
    pub fuse_observables: bool,

    /// Batch failure handling.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

/// Widest register any configuration may allow. A 34-qubit state is 256 GiB
/// of amplitudes; dense simulation stops being practical well before that.
pub const QUBIT_CEILING: u32 = 34;

fn default_true() -> bool {
    true
}

fn default_max_qubits() -> u32 {
    28
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            parallel: default_true(),
            num_threads: None,
            max_qubits: default_max_qubits(),
            retention: Retention::default(),
            fuse_observables: false,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl GradientConfig {
    /// Parse YAML text.
    pub fn from_yaml_str(text: &str) -> SimResult<Self> {
        let config: GradientConfig = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Load from `path` if given, else defaults, then apply environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> SimResult<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `QGRAD_NUM_THREADS`, `QGRAD_MAX_QUBITS` and `QGRAD_RETENTION`
    /// when set and parseable. Absent or malformed variables leave the value
    /// unchanged.
    fn merge_env(self) -> Self {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(n) = var("QGRAD_NUM_THREADS").and_then(|v| v.parse().ok()) {
            self.num_threads = Some(n);
        }
        if let Some(n) = var("QGRAD_MAX_QUBITS").and_then(|v| v.parse().ok()) {
            self.max_qubits = n;
        }
        if let Some(v) = var("QGRAD_RETENTION") {
            match v.to_ascii_lowercase().as_str() {
                "recompute" => self.retention = Retention::Recompute,
                "cache" => self.retention = Retention::Cache,
                _ => {}
            }
        }
        self
    }

    /// Reject inconsistent settings.
    pub fn validate(&self) -> SimResult<()> {
        if self.num_threads == Some(0) {
            return Err(SimError::ConfigInvalid(
                "num_threads must be at least 1".into(),
            ));
        }
        // 16-byte amplitudes, 2^N of them, must fit one allocation.
        let addressable = 2usize
            .checked_pow(self.max_qubits)
            .and_then(|amplitudes| amplitudes.checked_mul(16))
            .is_some_and(|bytes| bytes <= isize::MAX as usize);
        if self.max_qubits > QUBIT_CEILING || !addressable {
            return Err(SimError::ConfigInvalid(format!(
                "max_qubits {} exceeds the supported limit of {QUBIT_CEILING}",
                self.max_qubits
            )));
        }
        Ok(())
    }
}
