//! Error types for the sim crate.

use thiserror::Error;

/// Errors produced by simulation and gradient evaluation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// A target or Pauli qubit index is outside the register.
    #[error("Qubit {qubit} out of range for {num_qubits}-qubit state")]
    QubitOutOfRange {
        /// The offending qubit index.
        qubit: usize,
        /// Number of qubits in the state.
        num_qubits: usize,
    },

    /// The same qubit appears twice in one operand list.
    #[error("Qubit {qubit} appears more than once in {context}")]
    DuplicateQubit {
        /// The repeated qubit index.
        qubit: usize,
        /// Where it was found.
        context: &'static str,
    },

    /// Matrix dimension does not match the number of target qubits.
    #[error("Matrix of dimension {dim} cannot act on {targets} qubits")]
    MatrixDimension {
        /// Matrix row count.
        dim: usize,
        /// Number of target qubits supplied.
        targets: usize,
    },

    /// Two amplitude buffers of different sizes were combined.
    #[error("State dimension mismatch: expected {expected}, got {got}")]
    StateDimension {
        /// Expected amplitude count.
        expected: usize,
        /// Actual amplitude count.
        got: usize,
    },

    /// Circuit exceeds the configured qubit limit.
    #[error("Circuit has {num_qubits} qubits, limit is {max_qubits}")]
    TooManyQubits {
        /// Qubits in the circuit.
        num_qubits: u32,
        /// Configured maximum.
        max_qubits: u32,
    },

    /// Batch inputs disagree in shape.
    #[error("Shape mismatch: {0}")]
    Shape(String),

    /// A single batch entry failed.
    #[error("Batch entry {index}: {source}")]
    Entry {
        /// Row of the failing entry.
        index: usize,
        /// The underlying failure.
        #[source]
        source: Box<SimError>,
    },

    /// Circuit IR error (unknown gate, unresolved symbol, bad operands).
    #[error("Circuit IR error: {0}")]
    Ir(#[from] qgrad_ir::IrError),

    /// Dedicated worker pool could not be started.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Configuration file could not be read.
    #[error("Config IO error: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_yaml_ng::Error),

    /// Configuration values are inconsistent.
    #[error("Invalid config: {0}")]
    ConfigInvalid(String),
}

impl SimError {
    /// Attach the batch row index to this error.
    pub fn at_entry(self, index: usize) -> Self {
        SimError::Entry {
            index,
            source: Box::new(self),
        }
    }
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
