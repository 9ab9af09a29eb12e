//! Dense amplitude buffer.
//!
//! Qubit `q` is bit `q` of an amplitude index. Gate matrices address their
//! targets the other way round: the first target is the most significant bit
//! of the matrix's local index.

use num_complex::Complex64;
use qgrad_ir::Matrix;

use crate::error::{SimError, SimResult};
use crate::observable::PauliOp;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I_UNIT: Complex64 = Complex64::new(0.0, 1.0);

/// A statevector representing a quantum state, or any other vector in the
/// same space (a co-state need not be normalized).
#[derive(Debug, Clone, PartialEq)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let mut sv = Self::zeros(num_qubits);
        sv.amplitudes[0] = ONE;
        sv
    }

    /// The all-zero vector.
    pub fn zeros(num_qubits: usize) -> Self {
        Self {
            amplitudes: vec![ZERO; 1 << num_qubits],
            num_qubits,
        }
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of amplitudes.
    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    /// Always false; a buffer holds at least one amplitude.
    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }

    /// The amplitudes.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Overwrite this buffer with `other` without reallocating.
    pub fn copy_from(&mut self, other: &Statevector) -> SimResult<()> {
        self.check_same_size(other)?;
        self.amplitudes.copy_from_slice(&other.amplitudes);
        Ok(())
    }

    // =========================================================================
    // Linear algebra
    // =========================================================================

    /// `⟨other|self⟩`.
    pub fn inner_product(&self, other: &Statevector) -> SimResult<Complex64> {
        self.check_same_size(other)?;
        Ok(self
            .amplitudes
            .iter()
            .zip(&other.amplitudes)
            .map(|(a, b)| b.conj() * a)
            .sum())
    }

    /// Squared 2-norm.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }

    /// `self += factor · other`.
    pub fn add_scaled(&mut self, other: &Statevector, factor: Complex64) -> SimResult<()> {
        self.check_same_size(other)?;
        for (a, b) in self.amplitudes.iter_mut().zip(&other.amplitudes) {
            *a += factor * b;
        }
        Ok(())
    }

    /// Multiply every amplitude by `factor`.
    pub fn scale(&mut self, factor: Complex64) {
        for a in &mut self.amplitudes {
            *a *= factor;
        }
    }

    fn check_same_size(&self, other: &Statevector) -> SimResult<()> {
        if self.amplitudes.len() != other.amplitudes.len() {
            return Err(SimError::StateDimension {
                expected: self.amplitudes.len(),
                got: other.amplitudes.len(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Operator application
    // =========================================================================

    /// Left-multiply `matrix` into the subspace of `targets`.
    ///
    /// The matrix need not be unitary. `targets[0]` is the most significant
    /// bit of the matrix's local index.
    pub fn apply_matrix(&mut self, matrix: &Matrix, targets: &[usize]) -> SimResult<()> {
        self.check_targets(targets)?;
        if matrix.dim() != 1 << targets.len() {
            return Err(SimError::MatrixDimension {
                dim: matrix.dim(),
                targets: targets.len(),
            });
        }
        match targets {
            [qubit] => self.apply_single(matrix, *qubit),
            _ => self.apply_general(matrix, targets),
        }
        Ok(())
    }

    /// Apply a single-qubit Pauli operator.
    pub fn apply_pauli(&mut self, op: PauliOp, qubit: usize) -> SimResult<()> {
        self.check_targets(&[qubit])?;
        match op {
            PauliOp::I => {}
            PauliOp::X => self.apply_x(qubit),
            PauliOp::Y => self.apply_y(qubit),
            PauliOp::Z => self.apply_z(qubit),
        }
        Ok(())
    }

    fn check_targets(&self, targets: &[usize]) -> SimResult<()> {
        for (i, &q) in targets.iter().enumerate() {
            if q >= self.num_qubits {
                return Err(SimError::QubitOutOfRange {
                    qubit: q,
                    num_qubits: self.num_qubits,
                });
            }
            if targets[..i].contains(&q) {
                return Err(SimError::DuplicateQubit {
                    qubit: q,
                    context: "gate targets",
                });
            }
        }
        Ok(())
    }

    fn apply_single(&mut self, m: &Matrix, qubit: usize) {
        let stride = 1 << qubit;
        let (m00, m01, m10, m11) = (m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)]);
        for chunk in self.amplitudes.chunks_mut(stride * 2) {
            for j in 0..stride {
                let a = chunk[j];
                let b = chunk[j + stride];
                chunk[j] = m00 * a + m01 * b;
                chunk[j + stride] = m10 * a + m11 * b;
            }
        }
    }

    fn apply_general(&mut self, m: &Matrix, targets: &[usize]) {
        let k = targets.len();
        let dim = 1 << k;
        let mask: usize = targets.iter().map(|&q| 1 << q).sum();
        let offsets: Vec<usize> = (0..dim)
            .map(|local| {
                targets
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| (local >> (k - 1 - j)) & 1 == 1)
                    .map(|(_, &q)| 1 << q)
                    .sum::<usize>()
            })
            .collect();

        let mut local_in = vec![ZERO; dim];
        for base in 0..self.amplitudes.len() {
            if base & mask != 0 {
                continue;
            }
            for (slot, &off) in local_in.iter_mut().zip(&offsets) {
                *slot = self.amplitudes[base | off];
            }
            for (r, &off) in offsets.iter().enumerate() {
                let row = &m.data()[r * dim..(r + 1) * dim];
                self.amplitudes[base | off] =
                    row.iter().zip(&local_in).map(|(a, b)| a * b).sum();
            }
        }
    }

    fn apply_x(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                self.amplitudes.swap(i, i | mask);
            }
        }
    }

    fn apply_y(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = -I_UNIT * self.amplitudes[j];
                self.amplitudes[j] = I_UNIT * tmp;
            }
        }
    }

    fn apply_z(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask != 0 {
                *amp = -*amp;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qgrad_ir::Gate;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    fn unitary(gate: &Gate) -> Matrix {
        gate.unitary(&vec![1.0; gate.num_parameters()]).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert!(approx_eq(sv.amplitudes[0], ONE));
        assert!(sv.amplitudes[1..].iter().all(|a| approx_eq(*a, ZERO)));
        assert!((sv.norm_sqr() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hadamard() {
        let mut sv = Statevector::new(1);
        sv.apply_matrix(&unitary(&Gate::h()), &[0]).unwrap();

        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(sqrt2_inv, 0.0)));
        assert!(approx_eq(sv.amplitudes[1], Complex64::new(sqrt2_inv, 0.0)));
    }

    #[test]
    fn test_bell_state() {
        let mut sv = Statevector::new(2);
        sv.apply_matrix(&unitary(&Gate::h()), &[0]).unwrap();
        sv.apply_matrix(&unitary(&Gate::cnot()), &[0, 1]).unwrap();

        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(sqrt2_inv, 0.0)));
        assert!(approx_eq(sv.amplitudes[1], ZERO));
        assert!(approx_eq(sv.amplitudes[2], ZERO));
        assert!(approx_eq(sv.amplitudes[3], Complex64::new(sqrt2_inv, 0.0)));
    }

    #[test]
    fn test_cnot_control_is_first_target() {
        // Control on qubit 1, target qubit 0: |10⟩ (index 2) -> |11⟩ (index 3).
        let mut sv = Statevector::new(2);
        sv.apply_pauli(PauliOp::X, 1).unwrap();
        sv.apply_matrix(&unitary(&Gate::cnot()), &[1, 0]).unwrap();
        assert!(approx_eq(sv.amplitudes[3], ONE));
    }

    #[test]
    fn test_pauli_matches_gate_matrix() {
        let mut a = Statevector::new(2);
        a.apply_matrix(&unitary(&Gate::h()), &[1]).unwrap();
        let mut b = a.clone();

        a.apply_pauli(PauliOp::Y, 1).unwrap();
        b.apply_matrix(&unitary(&Gate::y()), &[1]).unwrap();
        for (x, y) in a.amplitudes().iter().zip(b.amplitudes()) {
            assert!(approx_eq(*x, *y));
        }
    }

    #[test]
    fn test_usage_errors() {
        let mut sv = Statevector::new(2);
        let h = unitary(&Gate::h());
        assert!(matches!(
            sv.apply_matrix(&h, &[2]),
            Err(SimError::QubitOutOfRange { qubit: 2, .. })
        ));
        assert!(matches!(
            sv.apply_matrix(&h, &[0, 1]),
            Err(SimError::MatrixDimension { dim: 2, targets: 2 })
        ));
        assert!(matches!(
            sv.apply_matrix(&unitary(&Gate::cnot()), &[1, 1]),
            Err(SimError::DuplicateQubit { qubit: 1, .. })
        ));
        assert!(matches!(
            sv.inner_product(&Statevector::new(3)),
            Err(SimError::StateDimension { .. })
        ));
    }

    #[test]
    fn test_inner_product_conjugates_other() {
        let mut a = Statevector::new(1);
        a.scale(I_UNIT);
        let b = Statevector::new(1);
        // ⟨b|a⟩ = i, ⟨a|b⟩ = -i
        assert!(approx_eq(a.inner_product(&b).unwrap(), I_UNIT));
        assert!(approx_eq(b.inner_product(&a).unwrap(), -I_UNIT));
    }
}
