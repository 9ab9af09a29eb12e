//! qgrad Circuit Intermediate Representation
//!
//! This crate provides the data structures for parameterized quantum circuits
//! and the closed gate library they are built from. It does no simulation; the
//! `qgrad-sim` crate consumes these types.
//!
//! # Core Components
//!
//! - **Qubits**: [`QubitId`] addresses a qubit by position
//! - **Gates**: [`Gate`], a closed set of gate families, each exposing its
//!   matrix ([`Gate::unitary`]) and the exact derivative of that matrix with
//!   respect to each parameter ([`Gate::derivative`])
//! - **Parameters**: [`ParameterExpression`] for symbolic gate arguments, with
//!   exact partial derivatives
//! - **Resolution**: [`SymbolTable`] fixes symbol column order and
//!   [`ParameterResolver`] binds one row of values to it
//! - **Instructions**: [`Instruction`] combining a gate with its operands
//! - **Circuit**: [`Circuit`] high-level builder API
//!
//! # Example: Building a Parameterized Circuit
//!
//! ```rust
//! use qgrad_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("ansatz", 2);
//! circuit
//!     .x_pow("alpha", QubitId(0))
//!     .unwrap()
//!     .y_pow("beta", QubitId(1))
//!     .unwrap()
//!     .cnot(QubitId(0), QubitId(1))
//!     .unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.num_parameterized(), 2);
//! ```
//!
//! # Example: Gate Derivatives
//!
//! ```rust
//! use qgrad_ir::{Circuit, QubitId, SymbolTable};
//!
//! let mut circuit = Circuit::with_size("fsim", 2);
//! circuit.fsim("gamma", "gamma", QubitId(0), QubitId(1)).unwrap();
//!
//! let table = SymbolTable::new(["gamma"]).unwrap();
//! let values = [0.789];
//! let resolver = table.resolver(&values).unwrap();
//!
//! let gate = &circuit.instructions()[0].gate;
//! let args = gate.parameter_values(&resolver).unwrap();
//! let d_theta = gate.derivative(&args, 0).unwrap();
//! assert_eq!(d_theta.dim(), 4);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Parameters |
//! |------|--------|------------|
//! | `I` | 1 | none |
//! | `XPow`, `YPow`, `ZPow`, `HPow` | 1 | exponent |
//! | `PhasedXPow` | 1 | phase exponent, exponent |
//! | `CZPow`, `CXPow`, `SwapPow`, `ISwapPow` | 2 | exponent |
//! | `XXPow`, `YYPow`, `ZZPow` | 2 | exponent |
//! | `FSim` | 2 | θ, φ |
//! | `PhasedISwapPow` | 2 | phase exponent, exponent |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod matrix;
pub mod parameter;
pub mod qubit;
pub mod resolver;
pub mod unitary;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{Gate, PowParams};
pub use instruction::Instruction;
pub use matrix::Matrix;
pub use parameter::ParameterExpression;
pub use qubit::QubitId;
pub use resolver::{ParameterResolver, SymbolTable};
