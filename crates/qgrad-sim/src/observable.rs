//! Pauli-sum observables.
//!
//! An observable is a sum of weighted Pauli strings:
//!
//!   O = Σ_k  c_k · P_k
//!
//! where each P_k is a tensor product of single-qubit Pauli operators
//! (I, X, Y, Z) and c_k ∈ ℝ, so O is Hermitian.
//!
//! # Example
//!
//! ```rust
//! use qgrad_sim::observable::{PauliOp, PauliString, PauliSum, PauliTerm};
//! use qgrad_sim::Statevector;
//!
//! // O = -1.0·Z₀Z₁  +  0.5·X₀
//! let o = PauliSum::from_terms(vec![
//!     PauliTerm::new(-1.0, PauliString::from_ops(vec![(0, PauliOp::Z), (1, PauliOp::Z)])),
//!     PauliTerm::new( 0.5, PauliString::from_ops(vec![(0, PauliOp::X)])),
//! ]);
//! assert_eq!(o.n_terms(), 2);
//!
//! // ⟨00|O|00⟩ = -1
//! let e = o.expectation(&Statevector::new(2)).unwrap();
//! assert!((e + 1.0).abs() < 1e-12);
//! ```

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::statevector::Statevector;

/// Single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PauliOp {
    /// Identity.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
}

/// A tensor product of Pauli operators on indexed qubits.
///
/// Stored as a sorted `Vec<(qubit_index, PauliOp)>` with Identity terms
/// omitted.  Qubits not listed are implicitly I.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauliString {
    /// Non-identity terms, sorted by qubit index ascending.
    ops: Vec<(u32, PauliOp)>,
}

impl PauliString {
    /// Construct a PauliString from an iterator of (qubit, op) pairs.
    ///
    /// Identity operators are dropped; the remaining ops are sorted by qubit.
    pub fn from_ops(ops: impl IntoIterator<Item = (u32, PauliOp)>) -> Self {
        let mut v: Vec<(u32, PauliOp)> = ops
            .into_iter()
            .filter(|(_, op)| *op != PauliOp::I)
            .collect();
        v.sort_by_key(|(q, _)| *q);
        Self { ops: v }
    }

    /// The identity string.
    pub fn identity() -> Self {
        Self { ops: vec![] }
    }

    /// Return the non-identity (qubit, op) pairs, sorted by qubit index.
    pub fn ops(&self) -> &[(u32, PauliOp)] {
        &self.ops
    }

    /// Check qubit indices against a register of `num_qubits`.
    ///
    /// Deserialized strings bypass [`PauliString::from_ops`], so a repeated
    /// qubit is rejected here rather than silently multiplied out.
    pub fn validate(&self, num_qubits: u32) -> SimResult<()> {
        for (i, &(q, _)) in self.ops.iter().enumerate() {
            if q >= num_qubits {
                return Err(SimError::QubitOutOfRange {
                    qubit: q as usize,
                    num_qubits: num_qubits as usize,
                });
            }
            if self.ops[..i].iter().any(|(p, _)| *p == q) {
                return Err(SimError::DuplicateQubit {
                    qubit: q as usize,
                    context: "Pauli string",
                });
            }
        }
        Ok(())
    }

    /// Apply the string to `state` in place.
    pub fn apply(&self, state: &mut Statevector) -> SimResult<()> {
        for &(q, op) in &self.ops {
            state.apply_pauli(op, q as usize)?;
        }
        Ok(())
    }
}

/// A single weighted Pauli term: `coeff · pauli`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliTerm {
    /// Real coefficient.
    pub coeff: f64,
    /// The Pauli string.
    pub pauli: PauliString,
}

impl PauliTerm {
    /// Create a new term.
    pub fn new(coeff: f64, pauli: PauliString) -> Self {
        Self { coeff, pauli }
    }

    /// Shorthand: single-qubit X term.
    pub fn x(qubit: u32, coeff: f64) -> Self {
        Self::new(coeff, PauliString::from_ops([(qubit, PauliOp::X)]))
    }

    /// Shorthand: single-qubit Y term.
    pub fn y(qubit: u32, coeff: f64) -> Self {
        Self::new(coeff, PauliString::from_ops([(qubit, PauliOp::Y)]))
    }

    /// Shorthand: single-qubit Z term.
    pub fn z(qubit: u32, coeff: f64) -> Self {
        Self::new(coeff, PauliString::from_ops([(qubit, PauliOp::Z)]))
    }

    /// Shorthand: ZZ coupling term.
    pub fn zz(q0: u32, q1: u32, coeff: f64) -> Self {
        Self::new(
            coeff,
            PauliString::from_ops([(q0, PauliOp::Z), (q1, PauliOp::Z)]),
        )
    }
}

/// A sum-of-Pauli-strings observable.
///
/// O = Σ_k  c_k · P_k
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PauliSum {
    terms: Vec<PauliTerm>,
}

impl PauliSum {
    /// Create from a list of terms.
    pub fn from_terms(terms: Vec<PauliTerm>) -> Self {
        Self { terms }
    }

    /// All terms.
    pub fn terms(&self) -> &[PauliTerm] {
        &self.terms
    }

    /// Number of terms.
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// Check every term against a register of `num_qubits`.
    pub fn validate(&self, num_qubits: u32) -> SimResult<()> {
        self.terms
            .iter()
            .try_for_each(|t| t.pauli.validate(num_qubits))
    }

    /// `O|state⟩` as a new vector.
    pub fn apply(&self, state: &Statevector) -> SimResult<Statevector> {
        let mut out = Statevector::zeros(state.num_qubits());
        self.accumulate(state, 1.0, &mut out)?;
        Ok(out)
    }

    /// `out += weight · O|state⟩`.
    pub fn accumulate(
        &self,
        state: &Statevector,
        weight: f64,
        out: &mut Statevector,
    ) -> SimResult<()> {
        let mut scratch = state.clone();
        for term in &self.terms {
            scratch.copy_from(state)?;
            term.pauli.apply(&mut scratch)?;
            out.add_scaled(&scratch, Complex64::new(weight * term.coeff, 0.0))?;
        }
        Ok(())
    }

    /// `⟨state|O|state⟩`.
    pub fn expectation(&self, state: &Statevector) -> SimResult<f64> {
        let applied = self.apply(state)?;
        Ok(applied.inner_product(state)?.re)
    }
}

impl FromIterator<PauliTerm> for PauliSum {
    fn from_iter<T: IntoIterator<Item = PauliTerm>>(iter: T) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}
