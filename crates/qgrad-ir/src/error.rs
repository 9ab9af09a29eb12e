//! Error types for the IR crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit index outside `[0, num_qubits)`.
    #[error("Qubit {qubit} out of range for {num_qubits}-qubit circuit{}", format_gate_context(.gate_name))]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Number of qubits in the circuit.
        num_qubits: u32,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Gate requires different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Duplicate qubit in operation.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Gate name not in the gate library.
    #[error("Unknown gate '{0}'")]
    UnknownGate(String),

    /// Wrong number of parameter values supplied to a gate.
    #[error("Gate '{gate_name}' takes {expected} parameters, got {got}")]
    ParameterCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of parameters.
        expected: usize,
        /// Actual number of parameters provided.
        got: usize,
    },

    /// Derivative requested for a parameter slot the gate does not have.
    #[error("Gate '{gate_name}' has no parameter {index}")]
    InvalidParameterIndex {
        /// Name of the gate.
        gate_name: String,
        /// The requested parameter index.
        index: usize,
    },

    /// Symbol referenced by an expression is not in the symbol table.
    #[error("Symbol '{0}' is not in the symbol table")]
    UnresolvedSymbol(String),

    /// Symbol table contains the same name twice.
    #[error("Duplicate symbol name '{0}'")]
    DuplicateSymbol(String),

    /// Row of symbol values does not match the symbol table.
    #[error("Expected {expected} symbol values, got {got}")]
    SymbolValueMismatch {
        /// Number of symbols in the table.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },

    /// Matrix data has the wrong length for its dimension.
    #[error("Matrix of dimension {dim} needs {expected} entries, got {got}")]
    MatrixShape {
        /// Requested dimension.
        dim: usize,
        /// Expected number of entries (`dim * dim`).
        expected: usize,
        /// Actual number of entries.
        got: usize,
    },
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
