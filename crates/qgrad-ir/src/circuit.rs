//! High-level circuit builder API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, PowParams};
use crate::instruction::Instruction;
use crate::parameter::ParameterExpression;
use crate::qubit::QubitId;

/// A parameterized quantum circuit.
///
/// An ordered list of [`Instruction`]s over a fixed number of qubits. Every
/// append is validated against the qubit count, so a `Circuit` that exists is
/// well-formed; deserialized circuits are validated the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CircuitRepr")]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Number of qubits.
    num_qubits: u32,
    /// Instructions in application order.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create an empty circuit over `num_qubits` qubits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            instructions: vec![],
        }
    }

    /// Append an instruction after checking its operands.
    pub fn push(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        instruction.validate(self.num_qubits)?;
        self.instructions.push(instruction);
        Ok(self)
    }

    /// Apply an arbitrary library gate.
    pub fn gate(
        &mut self,
        gate: Gate,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::new(gate, qubits))
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply the identity gate.
    pub fn identity(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(Gate::I, qubit))
    }

    /// Apply `X^t`.
    pub fn x_pow(
        &mut self,
        exponent: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(
            Gate::XPow(PowParams::new(exponent)),
            qubit,
        ))
    }

    /// Apply `Y^t`.
    pub fn y_pow(
        &mut self,
        exponent: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(
            Gate::YPow(PowParams::new(exponent)),
            qubit,
        ))
    }

    /// Apply `Z^t`.
    pub fn z_pow(
        &mut self,
        exponent: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(
            Gate::ZPow(PowParams::new(exponent)),
            qubit,
        ))
    }

    /// Apply `H^t`.
    pub fn h_pow(
        &mut self,
        exponent: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(
            Gate::HPow(PowParams::new(exponent)),
            qubit,
        ))
    }

    /// Apply Pauli-X.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(Gate::x(), qubit))
    }

    /// Apply Pauli-Y.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(Gate::y(), qubit))
    }

    /// Apply Pauli-Z.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(Gate::z(), qubit))
    }

    /// Apply Hadamard.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(Gate::h(), qubit))
    }

    /// Apply `Z^p · X^t · Z^-p`.
    pub fn phased_x_pow(
        &mut self,
        phase_exponent: impl Into<ParameterExpression>,
        exponent: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(
            Gate::PhasedXPow {
                phase_exponent: phase_exponent.into(),
                exponent: exponent.into(),
                global_shift: 0.0,
            },
            qubit,
        ))
    }

    // =========================================================================
    // Two-qubit gates
    // =========================================================================

    /// Apply `CZ^t`.
    pub fn cz_pow(
        &mut self,
        exponent: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(
            Gate::CZPow(PowParams::new(exponent)),
            q1,
            q2,
        ))
    }

    /// Apply `CNOT^t`.
    pub fn cx_pow(
        &mut self,
        exponent: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(
            Gate::CXPow(PowParams::new(exponent)),
            control,
            target,
        ))
    }

    /// Apply CNOT.
    pub fn cnot(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(Gate::cnot(), control, target))
    }

    /// Apply CZ.
    pub fn cz(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(Gate::cz(), q1, q2))
    }

    /// Apply `SWAP^t`.
    pub fn swap_pow(
        &mut self,
        exponent: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(
            Gate::SwapPow(PowParams::new(exponent)),
            q1,
            q2,
        ))
    }

    /// Apply SWAP.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(Gate::swap(), q1, q2))
    }

    /// Apply `ISWAP^t`.
    pub fn iswap_pow(
        &mut self,
        exponent: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(
            Gate::ISwapPow(PowParams::new(exponent)),
            q1,
            q2,
        ))
    }

    /// Apply iSWAP.
    pub fn iswap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(Gate::iswap(), q1, q2))
    }

    /// Apply `(X⊗X)^t`.
    pub fn xx_pow(
        &mut self,
        exponent: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(
            Gate::XXPow(PowParams::new(exponent)),
            q1,
            q2,
        ))
    }

    /// Apply `(Y⊗Y)^t`.
    pub fn yy_pow(
        &mut self,
        exponent: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(
            Gate::YYPow(PowParams::new(exponent)),
            q1,
            q2,
        ))
    }

    /// Apply `(Z⊗Z)^t`.
    pub fn zz_pow(
        &mut self,
        exponent: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(
            Gate::ZZPow(PowParams::new(exponent)),
            q1,
            q2,
        ))
    }

    /// Apply `FSim(θ, φ)`.
    pub fn fsim(
        &mut self,
        theta: impl Into<ParameterExpression>,
        phi: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(
            Gate::FSim {
                theta: theta.into(),
                phi: phi.into(),
            },
            q1,
            q2,
        ))
    }

    /// Apply `(Z^-p ⊗ Z^p) · ISWAP^t · (Z^p ⊗ Z^-p)`.
    pub fn phased_iswap_pow(
        &mut self,
        phase_exponent: impl Into<ParameterExpression>,
        exponent: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(
            Gate::PhasedISwapPow {
                phase_exponent: phase_exponent.into(),
                exponent: exponent.into(),
            },
            q1,
            q2,
        ))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Instructions in application order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True if the circuit has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Every symbol referenced by any gate, sorted.
    pub fn symbols(&self) -> BTreeSet<String> {
        self.instructions
            .iter()
            .flat_map(|inst| inst.gate.parameters())
            .flat_map(ParameterExpression::symbols)
            .collect()
    }

    /// Number of instructions whose gate references a symbol.
    pub fn num_parameterized(&self) -> usize {
        self.instructions
            .iter()
            .filter(|inst| inst.is_parameterized())
            .count()
    }

    /// Re-check every instruction against the qubit count.
    pub fn validate(&self) -> IrResult<()> {
        self.instructions
            .iter()
            .try_for_each(|inst| inst.validate(self.num_qubits))
    }
}

#[derive(Deserialize)]
struct CircuitRepr {
    #[serde(default)]
    name: String,
    num_qubits: u32,
    #[serde(default)]
    instructions: Vec<Instruction>,
}

impl TryFrom<CircuitRepr> for Circuit {
    type Error = IrError;

    fn try_from(repr: CircuitRepr) -> IrResult<Self> {
        let circuit = Self {
            name: repr.name,
            num_qubits: repr.num_qubits,
            instructions: repr.instructions,
        };
        circuit.validate()?;
        Ok(circuit)
    }
}
