//! Gate matrices and their exact parameter derivatives.
//!
//! Eigen-gate families are built from their spectral decomposition
//!
//! ```text
//! G^t     = Σ_k e^{iπt(λ_k+s)} P_k
//! dG^t/dt = Σ_k iπ(λ_k+s) e^{iπt(λ_k+s)} P_k
//! ```
//!
//! so the derivative is exact rather than a finite-difference estimate. The
//! phased families are conjugations by `Z^p` and are differentiated with the
//! product rule.

use num_complex::Complex64;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::matrix::Matrix;
use crate::resolver::ParameterResolver;

const I_UNIT: Complex64 = Complex64::new(0.0, 1.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Eigenvalue / projector pairs of an eigen-gate family.
type EigenComponents = Vec<(f64, Matrix)>;

impl Gate {
    /// Evaluate every parameter expression against `resolver`.
    pub fn parameter_values(&self, resolver: &ParameterResolver<'_>) -> IrResult<Vec<f64>> {
        self.parameters()
            .into_iter()
            .map(|p| p.evaluate(resolver))
            .collect()
    }

    /// The gate matrix for concrete parameter `values`.
    pub fn unitary(&self, values: &[f64]) -> IrResult<Matrix> {
        self.check_values(values)?;
        let shift = self.global_shift();
        Ok(match self {
            Gate::I => Matrix::identity(2),
            Gate::PhasedXPow { .. } => {
                let z = z_phase(values[0]);
                let x = eigen_unitary(&sigma_components(&pauli_x()), values[1], shift);
                z.matmul(&x).matmul(&z.dagger())
            }
            Gate::FSim { .. } => fsim(values[0], values[1]),
            Gate::PhasedISwapPow { .. } => {
                let a = iswap_phase(values[0]);
                let b = eigen_unitary(&iswap_components(), values[1], 0.0);
                a.matmul(&b).matmul(&a.dagger())
            }
            pow => eigen_unitary(&pow_components(pow), values[0], shift),
        })
    }

    /// Exact derivative of [`Gate::unitary`] with respect to parameter `index`,
    /// all other parameters held fixed.
    ///
    /// The result is generally not unitary.
    pub fn derivative(&self, values: &[f64], index: usize) -> IrResult<Matrix> {
        self.check_values(values)?;
        if index >= self.num_parameters() {
            return Err(IrError::InvalidParameterIndex {
                gate_name: self.name().to_string(),
                index,
            });
        }
        let shift = self.global_shift();
        Ok(match (self, index) {
            (Gate::I, _) => Matrix::zeros(2),
            (Gate::PhasedXPow { .. }, 0) => {
                let z = z_phase(values[0]);
                let dz = z_phase_derivative(values[0]);
                let x = eigen_unitary(&sigma_components(&pauli_x()), values[1], shift);
                let mut d = dz.matmul(&x).matmul(&z.dagger());
                d.add_scaled(&z.matmul(&x).matmul(&dz.dagger()), ONE);
                d
            }
            (Gate::PhasedXPow { .. }, _) => {
                let z = z_phase(values[0]);
                let dx = eigen_derivative(&sigma_components(&pauli_x()), values[1], shift);
                z.matmul(&dx).matmul(&z.dagger())
            }
            (Gate::FSim { .. }, 0) => fsim_theta_derivative(values[0]),
            (Gate::FSim { .. }, _) => fsim_phi_derivative(values[1]),
            (Gate::PhasedISwapPow { .. }, 0) => {
                let a = iswap_phase(values[0]);
                let da = iswap_phase_derivative(values[0]);
                let b = eigen_unitary(&iswap_components(), values[1], 0.0);
                let mut d = da.matmul(&b).matmul(&a.dagger());
                d.add_scaled(&a.matmul(&b).matmul(&da.dagger()), ONE);
                d
            }
            (Gate::PhasedISwapPow { .. }, _) => {
                let a = iswap_phase(values[0]);
                let db = eigen_derivative(&iswap_components(), values[1], 0.0);
                a.matmul(&db).matmul(&a.dagger())
            }
            (pow, _) => eigen_derivative(&pow_components(pow), values[0], shift),
        })
    }

    fn check_values(&self, values: &[f64]) -> IrResult<()> {
        if values.len() != self.num_parameters() {
            return Err(IrError::ParameterCountMismatch {
                gate_name: self.name().to_string(),
                expected: self.num_parameters(),
                got: values.len(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Eigen-gate machinery
// =============================================================================

#[inline]
fn phase(angle: f64) -> Complex64 {
    Complex64::from_polar(1.0, angle)
}

fn eigen_unitary(components: &EigenComponents, t: f64, shift: f64) -> Matrix {
    let mut u = Matrix::zeros(components[0].1.dim());
    for (lambda, projector) in components {
        u.add_scaled(projector, phase(PI * t * (lambda + shift)));
    }
    u
}

fn eigen_derivative(components: &EigenComponents, t: f64, shift: f64) -> Matrix {
    let mut d = Matrix::zeros(components[0].1.dim());
    for (lambda, projector) in components {
        let rate = I_UNIT * PI * (lambda + shift);
        d.add_scaled(projector, rate * phase(PI * t * (lambda + shift)));
    }
    d
}

/// `(I ± σ)/2` with eigenvalues 0 and 1, for any involutory `σ`.
fn sigma_components(sigma: &Matrix) -> EigenComponents {
    let id = Matrix::identity(sigma.dim());
    let mut plus = id.clone();
    plus.add_scaled(sigma, ONE);
    let mut minus = id;
    minus.add_scaled(sigma, -ONE);
    vec![
        (0.0, plus.scale(Complex64::new(0.5, 0.0))),
        (1.0, minus.scale(Complex64::new(0.5, 0.0))),
    ]
}

fn real4(rows: [[f64; 4]; 4]) -> Matrix {
    Matrix::from_real(4, rows.as_flattened())
}

fn iswap_components() -> EigenComponents {
    vec![
        (
            0.0,
            real4([
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ]),
        ),
        (
            0.5,
            real4([
                [0.0, 0.0, 0.0, 0.0],
                [0.0, 0.5, 0.5, 0.0],
                [0.0, 0.5, 0.5, 0.0],
                [0.0, 0.0, 0.0, 0.0],
            ]),
        ),
        (
            -0.5,
            real4([
                [0.0, 0.0, 0.0, 0.0],
                [0.0, 0.5, -0.5, 0.0],
                [0.0, -0.5, 0.5, 0.0],
                [0.0, 0.0, 0.0, 0.0],
            ]),
        ),
    ]
}

/// Spectral decomposition of the single-exponent families.
fn pow_components(gate: &Gate) -> EigenComponents {
    match gate {
        Gate::XPow(_) => sigma_components(&pauli_x()),
        Gate::YPow(_) => sigma_components(&pauli_y()),
        Gate::ZPow(_) => sigma_components(&pauli_z()),
        Gate::HPow(_) => sigma_components(&hadamard()),
        Gate::CZPow(_) => vec![
            (0.0, Matrix::diagonal(&[ONE, ONE, ONE, ZERO])),
            (1.0, Matrix::diagonal(&[ZERO, ZERO, ZERO, ONE])),
        ],
        Gate::CXPow(_) => vec![
            (
                0.0,
                real4([
                    [1.0, 0.0, 0.0, 0.0],
                    [0.0, 1.0, 0.0, 0.0],
                    [0.0, 0.0, 0.5, 0.5],
                    [0.0, 0.0, 0.5, 0.5],
                ]),
            ),
            (
                1.0,
                real4([
                    [0.0, 0.0, 0.0, 0.0],
                    [0.0, 0.0, 0.0, 0.0],
                    [0.0, 0.0, 0.5, -0.5],
                    [0.0, 0.0, -0.5, 0.5],
                ]),
            ),
        ],
        Gate::SwapPow(_) => vec![
            (
                0.0,
                real4([
                    [1.0, 0.0, 0.0, 0.0],
                    [0.0, 0.5, 0.5, 0.0],
                    [0.0, 0.5, 0.5, 0.0],
                    [0.0, 0.0, 0.0, 1.0],
                ]),
            ),
            (
                1.0,
                real4([
                    [0.0, 0.0, 0.0, 0.0],
                    [0.0, 0.5, -0.5, 0.0],
                    [0.0, -0.5, 0.5, 0.0],
                    [0.0, 0.0, 0.0, 0.0],
                ]),
            ),
        ],
        Gate::ISwapPow(_) => iswap_components(),
        Gate::XXPow(_) => sigma_components(&pauli_x().kron(&pauli_x())),
        Gate::YYPow(_) => sigma_components(&pauli_y().kron(&pauli_y())),
        Gate::ZZPow(_) => sigma_components(&pauli_z().kron(&pauli_z())),
        // Not eigen families; `unitary`/`derivative` handle them before falling through.
        Gate::I | Gate::PhasedXPow { .. } | Gate::FSim { .. } | Gate::PhasedISwapPow { .. } => {
            vec![(0.0, Matrix::identity(1 << gate.num_qubits()))]
        }
    }
}

// =============================================================================
// Fixed matrices
// =============================================================================

fn pauli_x() -> Matrix {
    Matrix::from_real(2, &[0.0, 1.0, 1.0, 0.0])
}

fn pauli_y() -> Matrix {
    let mut m = Matrix::zeros(2);
    m[(0, 1)] = -I_UNIT;
    m[(1, 0)] = I_UNIT;
    m
}

fn pauli_z() -> Matrix {
    Matrix::from_real(2, &[1.0, 0.0, 0.0, -1.0])
}

fn hadamard() -> Matrix {
    let r = FRAC_1_SQRT_2;
    Matrix::from_real(2, &[r, r, r, -r])
}

// =============================================================================
// Phased and fermionic families
// =============================================================================

/// `Z^p = diag(1, e^{iπp})`.
fn z_phase(p: f64) -> Matrix {
    Matrix::diagonal(&[ONE, phase(PI * p)])
}

fn z_phase_derivative(p: f64) -> Matrix {
    Matrix::diagonal(&[ZERO, I_UNIT * PI * phase(PI * p)])
}

/// `Z^-p ⊗ Z^p`; its adjoint is `Z^p ⊗ Z^-p`.
fn iswap_phase(p: f64) -> Matrix {
    Matrix::diagonal(&[ONE, phase(PI * p), phase(-PI * p), ONE])
}

fn iswap_phase_derivative(p: f64) -> Matrix {
    Matrix::diagonal(&[
        ZERO,
        I_UNIT * PI * phase(PI * p),
        -I_UNIT * PI * phase(-PI * p),
        ZERO,
    ])
}

fn fsim(theta: f64, phi: f64) -> Matrix {
    let (s, c) = theta.sin_cos();
    let mut m = Matrix::zeros(4);
    m[(0, 0)] = ONE;
    m[(1, 1)] = Complex64::new(c, 0.0);
    m[(1, 2)] = Complex64::new(0.0, -s);
    m[(2, 1)] = Complex64::new(0.0, -s);
    m[(2, 2)] = Complex64::new(c, 0.0);
    m[(3, 3)] = phase(-phi);
    m
}

fn fsim_theta_derivative(theta: f64) -> Matrix {
    let (s, c) = theta.sin_cos();
    let mut m = Matrix::zeros(4);
    m[(1, 1)] = Complex64::new(-s, 0.0);
    m[(1, 2)] = Complex64::new(0.0, -c);
    m[(2, 1)] = Complex64::new(0.0, -c);
    m[(2, 2)] = Complex64::new(-s, 0.0);
    m
}

fn fsim_phi_derivative(phi: f64) -> Matrix {
    let mut m = Matrix::zeros(4);
    m[(3, 3)] = -I_UNIT * phase(-phi);
    m
}
