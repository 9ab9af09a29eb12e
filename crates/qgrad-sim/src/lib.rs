//! `qgrad-sim` — state-vector simulation and adjoint-method gradients.
//!
//! Given a parameterized [`qgrad_ir::Circuit`], a row of symbol values and a
//! list of Pauli-sum observables, this crate computes
//!
//! - the expectation `⟨ψ|O|ψ⟩` of each observable on the final state, and
//! - the vector-Jacobian product `Σ_o w_o · ∂⟨O_o⟩/∂s` for every symbol `s`,
//!   with one forward pass and one reverse sweep per entry.
//!
//! The [`BatchDriver`] runs many independent entries across a rayon pool and
//! assembles `[batch, width]` output matrices.
//!
//! # Quick start
//!
//! ```rust
//! use qgrad_ir::{Circuit, QubitId, SymbolTable};
//! use qgrad_sim::{AdjointEngine, PauliSum, PauliTerm};
//!
//! let mut circuit = Circuit::with_size("rx", 1);
//! circuit.x_pow("t", QubitId(0)).unwrap();
//!
//! let table = SymbolTable::new(["t"]).unwrap();
//! let values = [0.5];
//! let resolver = table.resolver(&values).unwrap();
//! let z = PauliSum::from_terms(vec![PauliTerm::z(0, 1.0)]);
//!
//! // ⟨Z⟩ = cos(πt), so d⟨Z⟩/dt = -π at t = 0.5.
//! let grad = AdjointEngine::default()
//!     .gradient(&circuit, &resolver, &z, 1.0)
//!     .unwrap();
//! assert!((grad[0] + std::f64::consts::PI).abs() < 1e-9);
//! ```

pub mod adjoint;
pub mod batch;
pub mod config;
pub mod error;
pub mod expectation;
pub mod forward;
pub mod observable;
pub mod statevector;

pub use adjoint::{AdjointEngine, Sweep};
pub use batch::{BatchDriver, BatchEntry, BatchOutput, EntryFailure};
pub use config::{FailurePolicy, GradientConfig, QUBIT_CEILING, Retention};
pub use error::{SimError, SimResult};
pub use expectation::expectations;
pub use forward::{
    ForwardPass, ForwardSimulator, Resolution, ResolvedCircuit, ResolvedGate, simulate,
};
pub use observable::{PauliOp, PauliString, PauliSum, PauliTerm};
pub use statevector::Statevector;
