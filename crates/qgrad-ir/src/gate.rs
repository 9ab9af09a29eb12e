//! Quantum gate types.
//!
//! The gate set is closed: every gate is one of the [`Gate`] variants, and each
//! variant knows its matrix and the exact derivative of that matrix with
//! respect to each of its parameters (see [`crate::unitary`]).
//!
//! Most families use the exponent convention `G^t = Σ_k e^{iπt(λ_k+s)} P_k`
//! where `s` is a constant global shift.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::parameter::ParameterExpression;

/// Exponent and global shift of an eigen-gate family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowParams {
    /// The exponent `t`.
    pub exponent: ParameterExpression,
    /// The global shift `s`; constant.
    #[serde(default)]
    pub global_shift: f64,
}

impl PowParams {
    /// Exponent with zero global shift.
    pub fn new(exponent: impl Into<ParameterExpression>) -> Self {
        Self {
            exponent: exponent.into(),
            global_shift: 0.0,
        }
    }

    /// Set the global shift.
    #[must_use]
    pub fn with_global_shift(mut self, global_shift: f64) -> Self {
        self.global_shift = global_shift;
        self
    }
}

/// The gate library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// Identity gate.
    I,

    // Single-qubit eigen gates
    /// `X^t`.
    XPow(PowParams),
    /// `Y^t`.
    YPow(PowParams),
    /// `Z^t`.
    ZPow(PowParams),
    /// `H^t`.
    HPow(PowParams),

    // Two-qubit eigen gates
    /// `CZ^t`.
    CZPow(PowParams),
    /// `CNOT^t`; the first qubit is the control.
    CXPow(PowParams),
    /// `SWAP^t`.
    SwapPow(PowParams),
    /// `ISWAP^t`.
    ISwapPow(PowParams),
    /// `(X⊗X)^t`.
    XXPow(PowParams),
    /// `(Y⊗Y)^t`.
    YYPow(PowParams),
    /// `(Z⊗Z)^t`.
    ZZPow(PowParams),

    // Phased and fermionic gates
    /// `Z^p · X^t · Z^-p`.
    PhasedXPow {
        /// Phase exponent `p`.
        phase_exponent: ParameterExpression,
        /// Exponent `t`.
        exponent: ParameterExpression,
        /// Global shift of the inner `X^t`.
        #[serde(default)]
        global_shift: f64,
    },
    /// Fermionic simulation gate `FSim(θ, φ)`.
    FSim {
        /// Swap angle θ.
        theta: ParameterExpression,
        /// Controlled-phase angle φ.
        phi: ParameterExpression,
    },
    /// `(Z^-p ⊗ Z^p) · ISWAP^t · (Z^p ⊗ Z^-p)`.
    PhasedISwapPow {
        /// Phase exponent `p`.
        phase_exponent: ParameterExpression,
        /// Exponent `t`.
        exponent: ParameterExpression,
    },
}

impl Gate {
    /// Every gate name accepted by [`Gate::from_name`], one per family.
    pub const NAMES: [&'static str; 15] = [
        "i",
        "x_pow",
        "y_pow",
        "z_pow",
        "h_pow",
        "cz_pow",
        "cx_pow",
        "swap_pow",
        "iswap_pow",
        "xx_pow",
        "yy_pow",
        "zz_pow",
        "phased_x_pow",
        "fsim",
        "phased_iswap_pow",
    ];

    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Gate::I => "i",
            Gate::XPow(_) => "x_pow",
            Gate::YPow(_) => "y_pow",
            Gate::ZPow(_) => "z_pow",
            Gate::HPow(_) => "h_pow",
            Gate::CZPow(_) => "cz_pow",
            Gate::CXPow(_) => "cx_pow",
            Gate::SwapPow(_) => "swap_pow",
            Gate::ISwapPow(_) => "iswap_pow",
            Gate::XXPow(_) => "xx_pow",
            Gate::YYPow(_) => "yy_pow",
            Gate::ZZPow(_) => "zz_pow",
            Gate::PhasedXPow { .. } => "phased_x_pow",
            Gate::FSim { .. } => "fsim",
            Gate::PhasedISwapPow { .. } => "phased_iswap_pow",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            Gate::I
            | Gate::XPow(_)
            | Gate::YPow(_)
            | Gate::ZPow(_)
            | Gate::HPow(_)
            | Gate::PhasedXPow { .. } => 1,

            Gate::CZPow(_)
            | Gate::CXPow(_)
            | Gate::SwapPow(_)
            | Gate::ISwapPow(_)
            | Gate::XXPow(_)
            | Gate::YYPow(_)
            | Gate::ZZPow(_)
            | Gate::FSim { .. }
            | Gate::PhasedISwapPow { .. } => 2,
        }
    }

    /// Get parameters of this gate, in derivative-index order.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            Gate::I => vec![],

            Gate::XPow(p)
            | Gate::YPow(p)
            | Gate::ZPow(p)
            | Gate::HPow(p)
            | Gate::CZPow(p)
            | Gate::CXPow(p)
            | Gate::SwapPow(p)
            | Gate::ISwapPow(p)
            | Gate::XXPow(p)
            | Gate::YYPow(p)
            | Gate::ZZPow(p) => vec![&p.exponent],

            Gate::PhasedXPow {
                phase_exponent,
                exponent,
                ..
            }
            | Gate::PhasedISwapPow {
                phase_exponent,
                exponent,
            } => vec![phase_exponent, exponent],

            Gate::FSim { theta, phi } => vec![theta, phi],
        }
    }

    /// Number of parameter slots.
    pub fn num_parameters(&self) -> usize {
        match self {
            Gate::I => 0,
            Gate::PhasedXPow { .. } | Gate::PhasedISwapPow { .. } | Gate::FSim { .. } => 2,
            _ => 1,
        }
    }

    /// Check if any parameter references a symbol.
    pub fn is_parameterized(&self) -> bool {
        self.parameters().iter().any(|p| p.is_symbolic())
    }

    /// The constant global shift (zero for families without one).
    pub fn global_shift(&self) -> f64 {
        match self {
            Gate::XPow(p)
            | Gate::YPow(p)
            | Gate::ZPow(p)
            | Gate::HPow(p)
            | Gate::CZPow(p)
            | Gate::CXPow(p)
            | Gate::SwapPow(p)
            | Gate::ISwapPow(p)
            | Gate::XXPow(p)
            | Gate::YYPow(p)
            | Gate::ZZPow(p) => p.global_shift,
            Gate::PhasedXPow { global_shift, .. } => *global_shift,
            Gate::I | Gate::FSim { .. } | Gate::PhasedISwapPow { .. } => 0.0,
        }
    }

    /// Number of parameter slots the named family takes, or `None` if the
    /// name is unknown.
    pub fn arity(name: &str) -> Option<usize> {
        canonical_name(name).map(family_arity)
    }

    /// Construct a gate from its family name and parameters.
    ///
    /// Accepts the names in [`Gate::NAMES`] as well as the short upper-case
    /// identifiers of the serialized circuit format (`XP`, `CNP`, `FSIM`, ...).
    pub fn from_name(
        name: &str,
        params: Vec<ParameterExpression>,
        global_shift: f64,
    ) -> IrResult<Self> {
        let family = canonical_name(name).ok_or_else(|| IrError::UnknownGate(name.to_string()))?;
        let expected = family_arity(family);
        if params.len() != expected {
            return Err(IrError::ParameterCountMismatch {
                gate_name: family.to_string(),
                expected,
                got: params.len(),
            });
        }

        let mut params = params.into_iter();
        let mut next = || params.next().unwrap_or(ParameterExpression::Constant(0.0));
        let pow = |exponent| PowParams {
            exponent,
            global_shift,
        };

        Ok(match family {
            "i" => Gate::I,
            "x_pow" => Gate::XPow(pow(next())),
            "y_pow" => Gate::YPow(pow(next())),
            "z_pow" => Gate::ZPow(pow(next())),
            "h_pow" => Gate::HPow(pow(next())),
            "cz_pow" => Gate::CZPow(pow(next())),
            "cx_pow" => Gate::CXPow(pow(next())),
            "swap_pow" => Gate::SwapPow(pow(next())),
            "iswap_pow" => Gate::ISwapPow(pow(next())),
            "xx_pow" => Gate::XXPow(pow(next())),
            "yy_pow" => Gate::YYPow(pow(next())),
            "zz_pow" => Gate::ZZPow(pow(next())),
            "phased_x_pow" => Gate::PhasedXPow {
                phase_exponent: next(),
                exponent: next(),
                global_shift,
            },
            "fsim" => Gate::FSim {
                theta: next(),
                phi: next(),
            },
            _ => Gate::PhasedISwapPow {
                phase_exponent: next(),
                exponent: next(),
            },
        })
    }

    // =========================================================================
    // Fixed-exponent shorthands
    // =========================================================================

    /// Pauli-X.
    pub fn x() -> Self {
        Gate::XPow(PowParams::new(1.0))
    }

    /// Pauli-Y.
    pub fn y() -> Self {
        Gate::YPow(PowParams::new(1.0))
    }

    /// Pauli-Z.
    pub fn z() -> Self {
        Gate::ZPow(PowParams::new(1.0))
    }

    /// Hadamard.
    pub fn h() -> Self {
        Gate::HPow(PowParams::new(1.0))
    }

    /// Controlled-NOT.
    pub fn cnot() -> Self {
        Gate::CXPow(PowParams::new(1.0))
    }

    /// Controlled-Z.
    pub fn cz() -> Self {
        Gate::CZPow(PowParams::new(1.0))
    }

    /// SWAP.
    pub fn swap() -> Self {
        Gate::SwapPow(PowParams::new(1.0))
    }

    /// iSWAP.
    pub fn iswap() -> Self {
        Gate::ISwapPow(PowParams::new(1.0))
    }
}

fn family_arity(family: &str) -> usize {
    match family {
        "i" => 0,
        "phased_x_pow" | "phased_iswap_pow" | "fsim" => 2,
        _ => 1,
    }
}

fn canonical_name(name: &str) -> Option<&'static str> {
    if let Some(known) = Gate::NAMES.iter().find(|n| **n == name) {
        return Some(*known);
    }
    Some(match name.to_ascii_uppercase().as_str() {
        "I" => "i",
        "XP" => "x_pow",
        "YP" => "y_pow",
        "ZP" => "z_pow",
        "HP" => "h_pow",
        "CZP" => "cz_pow",
        "CNP" => "cx_pow",
        "SP" => "swap_pow",
        "ISP" => "iswap_pow",
        "XXP" => "xx_pow",
        "YYP" => "yy_pow",
        "ZZP" => "zz_pow",
        "PXP" => "phased_x_pow",
        "FSIM" => "fsim",
        "PISP" => "phased_iswap_pow",
        _ => return None,
    })
}
