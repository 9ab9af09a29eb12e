//! Expectation values of observables on a circuit's final state.

use qgrad_ir::{Circuit, ParameterResolver};

use crate::error::SimResult;
use crate::forward::{ensure_width, ForwardSimulator, ResolvedCircuit};
use crate::observable::PauliSum;

/// `⟨ψ|O_o|ψ⟩` for each observable, where `|ψ⟩` is the final state of
/// `circuit` at `resolver`.
pub fn expectations(
    circuit: &Circuit,
    resolver: &ParameterResolver<'_>,
    observables: &[PauliSum],
    max_qubits: u32,
) -> SimResult<Vec<f64>> {
    ensure_width(circuit, max_qubits)?;
    for observable in observables {
        observable.validate(circuit.num_qubits())?;
    }
    let resolved = ResolvedCircuit::forward_only(circuit, resolver)?;
    let psi = ForwardSimulator::new().run(&resolved)?.final_state;
    observables.iter().map(|o| o.expectation(&psi)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::PauliTerm;
    use approx::assert_relative_eq;
    use qgrad_ir::{QubitId, SymbolTable};

    #[test]
    fn test_bell_correlations() {
        let mut circuit = Circuit::with_size("bell", 2);
        circuit.h(QubitId(0)).unwrap().cnot(QubitId(0), QubitId(1)).unwrap();
        let table = SymbolTable::default();
        let resolver = table.resolver(&[]).unwrap();

        let zz = PauliSum::from_terms(vec![PauliTerm::zz(0, 1, 1.0)]);
        let z0 = PauliSum::from_terms(vec![PauliTerm::z(0, 1.0)]);
        let e = expectations(&circuit, &resolver, &[zz, z0], 28).unwrap();
        assert_relative_eq!(e[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(e[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_parameterized_rotation() {
        let mut circuit = Circuit::with_size("ry", 1);
        circuit.y_pow("t", QubitId(0)).unwrap();
        let table = SymbolTable::new(["t"]).unwrap();
        let values = [0.25];
        let resolver = table.resolver(&values).unwrap();

        let z = PauliSum::from_terms(vec![PauliTerm::z(0, 1.0)]);
        let e = expectations(&circuit, &resolver, &[z], 28).unwrap();
        assert_relative_eq!(e[0], (std::f64::consts::PI * 0.25).cos(), epsilon = 1e-12);
    }
}
