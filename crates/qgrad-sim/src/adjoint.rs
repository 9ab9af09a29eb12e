//! Adjoint-method gradient engine.
//!
//! For a circuit `U = U_G ⋯ U_1`, observable `O` and final state
//! `|ψ_f⟩ = U|0⟩`, the engine builds the co-state `|λ⟩ = O|ψ_f⟩` and sweeps
//! the gates in reverse. At gate `i` with pre-state `|ψ_i⟩`:
//!
//! ```text
//! ∂⟨O⟩/∂s += 2·Re⟨λ_i| dU_i/ds |ψ_i⟩
//! |λ_{i-1}⟩ = U_i† |λ_i⟩
//! ```
//!
//! One forward pass and one reverse sweep give the derivative for every
//! symbol at once. Upstream weights scale the co-state, which is linear in
//! the contribution, so a weighted sum of observables can share one sweep.

use num_complex::Complex64;
use qgrad_ir::{Circuit, ParameterResolver};
use tracing::{debug, instrument};

use crate::config::{GradientConfig, Retention};
use crate::error::{SimError, SimResult};
use crate::forward::{ensure_width, ForwardPass, ForwardSimulator, ResolvedCircuit, ResolvedGate};
use crate::observable::PauliSum;
use crate::statevector::Statevector;

/// Output of one reverse sweep.
#[derive(Debug, Clone)]
pub struct Sweep {
    /// Accumulated derivative per symbol column.
    pub gradient: Vec<f64>,
    /// The co-state pulled back to before the first gate.
    pub costate: Statevector,
}

/// Computes gradients of observable expectations with the adjoint method.
#[derive(Debug, Clone, Copy)]
pub struct AdjointEngine {
    retention: Retention,
    max_qubits: u32,
}

impl Default for AdjointEngine {
    fn default() -> Self {
        Self::from_config(&GradientConfig::default())
    }
}

impl AdjointEngine {
    /// Engine with the given pre-state strategy and the default qubit limit.
    pub fn new(retention: Retention) -> Self {
        Self {
            retention,
            ..Self::default()
        }
    }

    /// Engine matching a [`GradientConfig`].
    pub fn from_config(config: &GradientConfig) -> Self {
        Self {
            retention: config.retention,
            max_qubits: config.max_qubits,
        }
    }

    /// Override the qubit limit.
    #[must_use]
    pub fn with_max_qubits(mut self, max_qubits: u32) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// The pre-state strategy.
    pub fn retention(&self) -> Retention {
        self.retention
    }

    /// `upstream · ∂⟨O⟩/∂s` for every symbol `s` of the resolver's table.
    pub fn gradient(
        &self,
        circuit: &Circuit,
        resolver: &ParameterResolver<'_>,
        observable: &PauliSum,
        upstream: f64,
    ) -> SimResult<Vec<f64>> {
        self.gradients(
            circuit,
            resolver,
            std::slice::from_ref(observable),
            &[upstream],
            false,
        )
    }

    /// `Σ_o weights[o] · ∂⟨O_o⟩/∂s` for every symbol `s`.
    ///
    /// With `fused` the observables share one weighted co-state and one sweep;
    /// otherwise each observable gets its own sweep over the shared forward
    /// pass. The results agree up to rounding.
    #[instrument(
        skip_all,
        fields(
            circuit = circuit.name(),
            qubits = circuit.num_qubits(),
            observables = observables.len()
        )
    )]
    pub fn gradients(
        &self,
        circuit: &Circuit,
        resolver: &ParameterResolver<'_>,
        observables: &[PauliSum],
        weights: &[f64],
        fused: bool,
    ) -> SimResult<Vec<f64>> {
        if observables.len() != weights.len() {
            return Err(SimError::Shape(format!(
                "{} observables but {} upstream weights",
                observables.len(),
                weights.len()
            )));
        }
        ensure_width(circuit, self.max_qubits)?;
        for observable in observables {
            observable.validate(circuit.num_qubits())?;
        }

        let resolved = ResolvedCircuit::new(circuit, resolver)?;
        if !resolved.is_differentiable() || observables.is_empty() {
            debug!(
                parameterized = circuit.num_parameterized(),
                "no differentiable gates; gradient is zero"
            );
            return Ok(vec![0.0; resolved.num_symbols()]);
        }

        let pass = self.forward(&resolved)?;
        let psi = &pass.final_state;

        if fused {
            let mut costate = Statevector::zeros(psi.num_qubits());
            for (observable, &w) in observables.iter().zip(weights) {
                observable.accumulate(psi, w, &mut costate)?;
            }
            return Ok(self.reverse_sweep(&resolved, &pass, costate)?.gradient);
        }

        let mut total = vec![0.0; resolved.num_symbols()];
        let mut costate = Statevector::zeros(psi.num_qubits());
        for (observable, &w) in observables.iter().zip(weights) {
            costate.scale(Complex64::new(0.0, 0.0));
            observable.accumulate(psi, w, &mut costate)?;
            let sweep = self.reverse_sweep(&resolved, &pass, costate)?;
            for (t, g) in total.iter_mut().zip(&sweep.gradient) {
                *t += g;
            }
            costate = sweep.costate;
        }
        debug!(symbols = total.len(), "adjoint gradient complete");
        Ok(total)
    }

    /// Forward pass honouring the retention strategy.
    pub fn forward(&self, resolved: &ResolvedCircuit) -> SimResult<ForwardPass> {
        let simulator = match self.retention {
            Retention::Recompute => ForwardSimulator::new(),
            Retention::Cache => ForwardSimulator::retaining_pre_states(),
        };
        simulator.run(resolved)
    }

    /// Sweep `costate` backwards through `resolved`, accumulating
    /// `2·Re⟨λ|dU/ds|ψ⟩` per symbol.
    ///
    /// Pre-gate states come from `pass.pre_states` when present, otherwise
    /// they are rewound from the final state alongside the co-state.
    pub fn reverse_sweep(
        &self,
        resolved: &ResolvedCircuit,
        pass: &ForwardPass,
        mut costate: Statevector,
    ) -> SimResult<Sweep> {
        let mut gradient = vec![0.0; resolved.num_symbols()];
        let mut pre_states = match pass.pre_states.as_deref() {
            Some(states) => PreStates::Cached(states),
            None => PreStates::Rewound(pass.final_state.clone()),
        };
        let mut scratch = Statevector::zeros(resolved.num_qubits());

        for (index, gate) in resolved.gates().iter().enumerate().rev() {
            let pre = pre_states.before(index, gate)?;
            for (column, derivative) in &gate.derivatives {
                scratch.copy_from(pre)?;
                scratch.apply_matrix(derivative, &gate.targets)?;
                let overlap = scratch.inner_product(&costate)?;
                if let Some(slot) = gradient.get_mut(*column) {
                    *slot += 2.0 * overlap.re;
                }
            }
            costate.apply_matrix(&gate.inverse, &gate.targets)?;
        }

        Ok(Sweep { gradient, costate })
    }
}

/// Source of the state before each gate during the reverse sweep.
enum PreStates<'a> {
    /// Stored by the forward pass.
    Cached(&'a [Statevector]),
    /// Rewound one gate at a time from the final state.
    Rewound(Statevector),
}

impl PreStates<'_> {
    /// State before gate `index`; must be called for every gate, last first.
    fn before(&mut self, index: usize, gate: &ResolvedGate) -> SimResult<&Statevector> {
        match self {
            PreStates::Cached(states) => {
                let states: &[Statevector] = states;
                states.get(index).ok_or_else(|| {
                    SimError::Shape(format!(
                        "forward pass cached {} pre-states, gate {index} requested",
                        states.len()
                    ))
                })
            }
            PreStates::Rewound(state) => {
                state.apply_matrix(&gate.inverse, &gate.targets)?;
                Ok(state)
            }
        }
    }
}
