//! Forward simulation of a circuit at one parameter resolution.
//!
//! A [`ResolvedCircuit`] is the circuit with every gate's matrix, inverse,
//! and per-symbol derivative evaluated once. Both the forward pass and the
//! reverse sweep of the adjoint engine run on it. Expectation-only callers
//! resolve with [`Resolution::Forward`] and skip the derivatives.

use qgrad_ir::{Circuit, Gate, Matrix, ParameterResolver};
use tracing::trace;

use crate::error::{SimError, SimResult};
use crate::statevector::Statevector;

/// Reject circuits wider than `max_qubits` before allocating a buffer.
pub fn ensure_width(circuit: &Circuit, max_qubits: u32) -> SimResult<()> {
    if circuit.num_qubits() > max_qubits {
        return Err(SimError::TooManyQubits {
            num_qubits: circuit.num_qubits(),
            max_qubits,
        });
    }
    Ok(())
}

/// Which matrices resolution evaluates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Resolution {
    /// Unitary and inverse only; enough for a forward pass.
    Forward,
    /// Also the per-symbol derivative matrices for the reverse sweep.
    #[default]
    Gradient,
}

/// One gate with concrete matrices.
#[derive(Debug, Clone)]
pub struct ResolvedGate {
    /// Gate family name, for diagnostics.
    pub name: &'static str,
    /// Target qubits, first target most significant.
    pub targets: Vec<usize>,
    /// The gate unitary.
    pub unitary: Matrix,
    /// Its conjugate transpose.
    pub inverse: Matrix,
    /// `dU/ds` for every symbol column `s` the gate depends on, ascending.
    /// Empty under [`Resolution::Forward`].
    pub derivatives: Vec<(usize, Matrix)>,
}

impl ResolvedGate {
    /// Evaluate `gate` on `targets` at `resolver`.
    ///
    /// The chain rule runs here: a gate whose parameters `e_i` depend on symbol
    /// `s` gets `dU/ds = Σ_i ∂U/∂e_i · ∂e_i/∂s`, so a symbol appearing in more
    /// than one slot (`FSim(γ, γ)`) sums its contributions.
    pub fn resolve(
        gate: &Gate,
        targets: Vec<usize>,
        resolver: &ParameterResolver<'_>,
        resolution: Resolution,
    ) -> SimResult<Self> {
        let args = gate.parameter_values(resolver)?;
        let unitary = gate.unitary(&args)?;
        let inverse = unitary.dagger();

        if resolution == Resolution::Forward {
            return Ok(Self {
                name: gate.name(),
                targets,
                unitary,
                inverse,
                derivatives: Vec::new(),
            });
        }

        let params = gate.parameters();
        let mut columns: Vec<(usize, String)> = Vec::new();
        for name in params.iter().flat_map(|p| p.symbols()) {
            let column = resolver.index_of(&name)?;
            if !columns.iter().any(|(c, _)| *c == column) {
                columns.push((column, name));
            }
        }
        columns.sort_by_key(|(c, _)| *c);

        let mut derivatives = Vec::with_capacity(columns.len());
        for (column, name) in columns {
            let mut total = Matrix::zeros(unitary.dim());
            for (index, expr) in params.iter().enumerate() {
                let weight = expr.partial(&name, resolver)?;
                if weight != 0.0 {
                    let d = gate.derivative(&args, index)?;
                    total.add_scaled(&d, weight.into());
                }
            }
            derivatives.push((column, total));
        }

        Ok(Self {
            name: gate.name(),
            targets,
            unitary,
            inverse,
            derivatives,
        })
    }

    /// True if the gate contributes to at least one symbol's gradient.
    pub fn is_differentiable(&self) -> bool {
        !self.derivatives.is_empty()
    }
}

/// A circuit with every gate resolved.
#[derive(Debug, Clone)]
pub struct ResolvedCircuit {
    num_qubits: usize,
    num_symbols: usize,
    gates: Vec<ResolvedGate>,
}

impl ResolvedCircuit {
    /// Resolve every instruction of `circuit`, derivatives included.
    ///
    /// Fails with an unresolved-symbol error if a gate references a symbol that
    /// is not in the resolver's table.
    pub fn new(circuit: &Circuit, resolver: &ParameterResolver<'_>) -> SimResult<Self> {
        Self::with_resolution(circuit, resolver, Resolution::Gradient)
    }

    /// Resolve only what a forward pass needs.
    pub fn forward_only(circuit: &Circuit, resolver: &ParameterResolver<'_>) -> SimResult<Self> {
        Self::with_resolution(circuit, resolver, Resolution::Forward)
    }

    /// Resolve every instruction of `circuit` at the given depth.
    pub fn with_resolution(
        circuit: &Circuit,
        resolver: &ParameterResolver<'_>,
        resolution: Resolution,
    ) -> SimResult<Self> {
        let gates = circuit
            .instructions()
            .iter()
            .map(|inst| ResolvedGate::resolve(&inst.gate, inst.targets(), resolver, resolution))
            .collect::<SimResult<Vec<_>>>()?;
        Ok(Self {
            num_qubits: circuit.num_qubits() as usize,
            num_symbols: resolver.table().len(),
            gates,
        })
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Width of the symbol table the circuit was resolved against.
    pub fn num_symbols(&self) -> usize {
        self.num_symbols
    }

    /// True if any gate depends on a symbol.
    pub fn is_differentiable(&self) -> bool {
        self.gates.iter().any(ResolvedGate::is_differentiable)
    }

    /// Resolved gates in application order.
    pub fn gates(&self) -> &[ResolvedGate] {
        &self.gates
    }
}

/// Result of a forward pass.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    /// `U_G ⋯ U_1 |0…0⟩`.
    pub final_state: Statevector,
    /// The state immediately before each gate, if retained.
    pub pre_states: Option<Vec<Statevector>>,
}

/// Applies resolved gates in order starting from |0…0⟩.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardSimulator {
    retain_pre_states: bool,
}

impl ForwardSimulator {
    /// Simulator that keeps only the final state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulator that also keeps the state before every gate.
    pub fn retaining_pre_states() -> Self {
        Self {
            retain_pre_states: true,
        }
    }

    /// Run the forward pass.
    pub fn run(&self, circuit: &ResolvedCircuit) -> SimResult<ForwardPass> {
        let mut state = Statevector::new(circuit.num_qubits());
        let mut pre_states = self
            .retain_pre_states
            .then(|| Vec::with_capacity(circuit.gates().len()));

        for gate in circuit.gates() {
            if let Some(cache) = pre_states.as_mut() {
                cache.push(state.clone());
            }
            state.apply_matrix(&gate.unitary, &gate.targets)?;
        }
        trace!(
            gates = circuit.gates().len(),
            norm = state.norm_sqr(),
            "forward pass complete"
        );

        Ok(ForwardPass {
            final_state: state,
            pre_states,
        })
    }
}

/// Final state of `circuit` at `resolver`.
pub fn simulate(circuit: &Circuit, resolver: &ParameterResolver<'_>) -> SimResult<Statevector> {
    let resolved = ResolvedCircuit::forward_only(circuit, resolver)?;
    Ok(ForwardSimulator::new().run(&resolved)?.final_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use qgrad_ir::{IrError, QubitId, SymbolTable};

    #[test]
    fn test_fixed_gates_have_no_derivatives() {
        let mut circuit = Circuit::with_size("fixed", 2);
        circuit.h(QubitId(0)).unwrap().cnot(QubitId(0), QubitId(1)).unwrap();

        let table = SymbolTable::new(["unused"]).unwrap();
        let values = [0.3];
        let resolver = table.resolver(&values).unwrap();
        let resolved = ResolvedCircuit::new(&circuit, &resolver).unwrap();
        assert!(resolved.gates().iter().all(|g| !g.is_differentiable()));
    }

    #[test]
    fn test_repeated_symbol_sums_slots() {
        let mut circuit = Circuit::with_size("fsim", 2);
        circuit
            .fsim("gamma", "gamma", QubitId(0), QubitId(1))
            .unwrap();

        let table = SymbolTable::new(["gamma"]).unwrap();
        let values = [0.789];
        let resolver = table.resolver(&values).unwrap();
        let resolved = ResolvedCircuit::new(&circuit, &resolver).unwrap();
        let gate = &resolved.gates()[0];

        assert_eq!(gate.derivatives.len(), 1);
        let (column, d) = &gate.derivatives[0];
        assert_eq!(*column, 0);

        let g = &circuit.instructions()[0].gate;
        let mut expected = g.derivative(&[0.789, 0.789], 0).unwrap();
        expected.add_scaled(
            &g.derivative(&[0.789, 0.789], 1).unwrap(),
            Complex64::new(1.0, 0.0),
        );
        assert!(d.max_abs_diff(&expected) < 1e-12);
    }

    #[test]
    fn test_forward_only_skips_derivatives() {
        let mut circuit = Circuit::with_size("c", 2);
        circuit
            .x_pow("alpha", QubitId(0))
            .unwrap()
            .fsim("alpha", 0.5, QubitId(0), QubitId(1))
            .unwrap();

        let table = SymbolTable::new(["alpha"]).unwrap();
        let values = [0.3];
        let resolver = table.resolver(&values).unwrap();
        let forward = ResolvedCircuit::forward_only(&circuit, &resolver).unwrap();
        let full = ResolvedCircuit::new(&circuit, &resolver).unwrap();

        assert!(!forward.is_differentiable());
        assert!(full.is_differentiable());
        for (f, g) in forward.gates().iter().zip(full.gates()) {
            assert!(f.derivatives.is_empty());
            assert_eq!(f.unitary, g.unitary);
        }

        let a = ForwardSimulator::new().run(&forward).unwrap().final_state;
        let b = ForwardSimulator::new().run(&full).unwrap().final_state;
        assert_eq!(a, b);
    }

    #[test]
    fn test_forward_only_still_checks_symbols() {
        let mut circuit = Circuit::with_size("c", 1);
        circuit.x_pow("missing", QubitId(0)).unwrap();

        let table = SymbolTable::new(["alpha"]).unwrap();
        let values = [0.1];
        let resolver = table.resolver(&values).unwrap();
        assert!(matches!(
            ResolvedCircuit::forward_only(&circuit, &resolver),
            Err(SimError::Ir(IrError::UnresolvedSymbol(_)))
        ));
    }

    #[test]
    fn test_unresolved_symbol() {
        let mut circuit = Circuit::with_size("c", 1);
        circuit.x_pow("missing", QubitId(0)).unwrap();

        let table = SymbolTable::new(["alpha"]).unwrap();
        let values = [0.1];
        let resolver = table.resolver(&values).unwrap();
        assert!(matches!(
            ResolvedCircuit::new(&circuit, &resolver),
            Err(SimError::Ir(IrError::UnresolvedSymbol(name))) if name == "missing"
        ));
    }

    #[test]
    fn test_pre_states_retained() {
        let mut circuit = Circuit::with_size("c", 1);
        circuit.x(QubitId(0)).unwrap().h(QubitId(0)).unwrap();

        let table = SymbolTable::default();
        let resolver = table.resolver(&[]).unwrap();
        let resolved = ResolvedCircuit::new(&circuit, &resolver).unwrap();

        let pass = ForwardSimulator::retaining_pre_states().run(&resolved).unwrap();
        let pre = pass.pre_states.unwrap();
        assert_eq!(pre.len(), 2);
        assert_eq!(pre[0], Statevector::new(1));
        assert!((pre[1].amplitudes()[1].re - 1.0).abs() < 1e-12);
        assert!((pass.final_state.norm_sqr() - 1.0).abs() < 1e-12);

        assert!(ForwardSimulator::new().run(&resolved).unwrap().pre_states.is_none());
    }
}
