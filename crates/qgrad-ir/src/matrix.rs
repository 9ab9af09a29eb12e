//! Dense complex square matrices for gate unitaries and their derivatives.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use crate::error::{IrError, IrResult};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// A `dim × dim` complex matrix stored row-major.
///
/// For a k-qubit gate `dim = 2^k` and the first target qubit is the most
/// significant bit of the row/column index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    dim: usize,
    data: Vec<Complex64>,
}

impl Matrix {
    /// All-zero matrix.
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![ZERO; dim * dim],
        }
    }

    /// Identity matrix.
    pub fn identity(dim: usize) -> Self {
        let mut m = Self::zeros(dim);
        for i in 0..dim {
            m.data[i * dim + i] = ONE;
        }
        m
    }

    /// Diagonal matrix from its diagonal entries.
    pub fn diagonal(entries: &[Complex64]) -> Self {
        let mut m = Self::zeros(entries.len());
        for (i, &v) in entries.iter().enumerate() {
            m.data[i * m.dim + i] = v;
        }
        m
    }

    /// Build from row-major data.
    pub fn from_vec(dim: usize, data: Vec<Complex64>) -> IrResult<Self> {
        if data.len() != dim * dim {
            return Err(IrError::MatrixShape {
                dim,
                expected: dim * dim,
                got: data.len(),
            });
        }
        Ok(Self { dim, data })
    }

    /// Build from real row-major data.
    pub(crate) fn from_real(dim: usize, data: &[f64]) -> Self {
        debug_assert_eq!(data.len(), dim * dim);
        Self {
            dim,
            data: data.iter().map(|&v| Complex64::new(v, 0.0)).collect(),
        }
    }

    /// Row and column count.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of qubits this matrix acts on (`log2(dim)`).
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.dim.trailing_zeros() as usize
    }

    /// Row-major entries.
    #[inline]
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    /// Conjugate transpose.
    pub fn dagger(&self) -> Self {
        let n = self.dim;
        let mut out = Self::zeros(n);
        for r in 0..n {
            for c in 0..n {
                out.data[c * n + r] = self.data[r * n + c].conj();
            }
        }
        out
    }

    /// Matrix product `self · rhs`.
    pub fn matmul(&self, rhs: &Matrix) -> Self {
        debug_assert_eq!(self.dim, rhs.dim);
        let n = self.dim;
        let mut out = Self::zeros(n);
        for r in 0..n {
            for k in 0..n {
                let a = self.data[r * n + k];
                if a == ZERO {
                    continue;
                }
                for c in 0..n {
                    out.data[r * n + c] += a * rhs.data[k * n + c];
                }
            }
        }
        out
    }

    /// Kronecker product `self ⊗ rhs`; `self` occupies the high bits.
    pub fn kron(&self, rhs: &Matrix) -> Self {
        let (n, m) = (self.dim, rhs.dim);
        let dim = n * m;
        let mut out = Self::zeros(dim);
        for r in 0..dim {
            for c in 0..dim {
                out.data[r * dim + c] =
                    self.data[(r / m) * n + c / m] * rhs.data[(r % m) * m + c % m];
            }
        }
        out
    }

    /// Multiply every entry by `factor`.
    #[must_use]
    pub fn scale(mut self, factor: Complex64) -> Self {
        for v in &mut self.data {
            *v *= factor;
        }
        self
    }

    /// `self += factor · other`.
    pub fn add_scaled(&mut self, other: &Matrix, factor: Complex64) {
        debug_assert_eq!(self.dim, other.dim);
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += factor * b;
        }
    }

    /// Largest entrywise distance to `other`.
    pub fn max_abs_diff(&self, other: &Matrix) -> f64 {
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }

    /// True if every entry is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|v| *v == ZERO)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Complex64;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &Complex64 {
        &self.data[r * self.dim + c]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut Complex64 {
        &mut self.data[r * self.dim + c]
    }
}
