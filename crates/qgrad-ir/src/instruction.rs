//! Circuit instructions combining gates with operands.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::parameter::ParameterExpression;
use crate::qubit::QubitId;

/// A gate applied to an ordered list of target qubits.
///
/// The first qubit is the most significant bit of the gate matrix's local
/// index (the control of a `CXPow`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InstructionRepr", into = "InstructionRepr")]
pub struct Instruction {
    /// The gate.
    pub gate: Gate,
    /// Qubits this instruction operates on.
    pub qubits: Vec<QubitId>,
}

impl Instruction {
    /// Create a gate instruction.
    pub fn new(gate: Gate, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            gate,
            qubits: qubits.into_iter().collect(),
        }
    }

    /// Create a single-qubit gate instruction.
    pub fn single_qubit_gate(gate: Gate, qubit: QubitId) -> Self {
        Self::new(gate, [qubit])
    }

    /// Create a two-qubit gate instruction.
    pub fn two_qubit_gate(gate: Gate, q1: QubitId, q2: QubitId) -> Self {
        Self::new(gate, [q1, q2])
    }

    /// Get the name of the gate.
    pub fn name(&self) -> &'static str {
        self.gate.name()
    }

    /// Check if any gate parameter references a symbol.
    pub fn is_parameterized(&self) -> bool {
        self.gate.is_parameterized()
    }

    /// Qubit positions as buffer indices.
    pub fn targets(&self) -> Vec<usize> {
        self.qubits.iter().map(|q| q.index()).collect()
    }

    /// Check operands against a circuit of `num_qubits` qubits.
    pub fn validate(&self, num_qubits: u32) -> IrResult<()> {
        let gate_name = self.gate.name();
        let got = u32::try_from(self.qubits.len()).unwrap_or(u32::MAX);
        if got != self.gate.num_qubits() {
            return Err(IrError::QubitCountMismatch {
                gate_name: gate_name.to_string(),
                expected: self.gate.num_qubits(),
                got,
            });
        }
        for (i, &qubit) in self.qubits.iter().enumerate() {
            if qubit.0 >= num_qubits {
                return Err(IrError::QubitOutOfRange {
                    qubit,
                    num_qubits,
                    gate_name: Some(gate_name.to_string()),
                });
            }
            if self.qubits[..i].contains(&qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: Some(gate_name.to_string()),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Serialized form
// =============================================================================

/// Flat wire form: `{"gate": "x_pow", "params": [...], "qubits": [0]}`.
#[derive(Serialize, Deserialize)]
struct InstructionRepr {
    gate: String,
    #[serde(default)]
    params: Vec<ParameterExpression>,
    #[serde(default, skip_serializing_if = "is_zero")]
    global_shift: f64,
    qubits: Vec<QubitId>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

impl TryFrom<InstructionRepr> for Instruction {
    type Error = IrError;

    fn try_from(repr: InstructionRepr) -> IrResult<Self> {
        let gate = Gate::from_name(&repr.gate, repr.params, repr.global_shift)?;
        Ok(Self::new(gate, repr.qubits))
    }
}

impl From<Instruction> for InstructionRepr {
    fn from(inst: Instruction) -> Self {
        Self {
            gate: inst.gate.name().to_string(),
            params: inst.gate.parameters().into_iter().cloned().collect(),
            global_shift: inst.gate.global_shift(),
            qubits: inst.qubits,
        }
    }
}
