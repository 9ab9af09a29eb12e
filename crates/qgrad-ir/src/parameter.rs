//! Parameter expressions for parameterized circuits.
//!
//! A gate argument is a small expression tree over named symbols. Besides
//! evaluation against a [`ParameterResolver`], every expression can report its
//! exact partial derivative with respect to any symbol, which is what the
//! gradient engine multiplies into the gate's own derivative matrix.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::PI;
use std::fmt;

use crate::error::IrResult;
use crate::resolver::ParameterResolver;

/// A symbolic or concrete parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A constant numeric value.
    Constant(f64),
    /// A symbolic parameter.
    Symbol(String),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<ParameterExpression>),
    /// Addition.
    Add(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Subtraction.
    Sub(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Multiplication.
    Mul(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Division.
    Div(Box<ParameterExpression>, Box<ParameterExpression>),
}

impl ParameterExpression {
    /// Create a constant parameter.
    pub fn constant(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    /// Create a symbolic parameter.
    pub fn symbol(name: impl Into<String>) -> Self {
        ParameterExpression::Symbol(name.into())
    }

    /// Create a π constant.
    pub fn pi() -> Self {
        ParameterExpression::Pi
    }

    /// `scale * symbol`, the form serialized circuits use for scaled exponents.
    pub fn scaled_symbol(scale: f64, name: impl Into<String>) -> Self {
        ParameterExpression::Mul(
            Box::new(ParameterExpression::Constant(scale)),
            Box::new(ParameterExpression::Symbol(name.into())),
        )
    }

    /// Check if this expression contains any symbols.
    pub fn is_symbolic(&self) -> bool {
        match self {
            ParameterExpression::Symbol(_) => true,
            ParameterExpression::Constant(_) | ParameterExpression::Pi => false,
            ParameterExpression::Neg(e) => e.is_symbolic(),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b) => a.is_symbolic() || b.is_symbolic(),
        }
    }

    /// Get all symbol names in this expression.
    pub fn symbols(&self) -> HashSet<String> {
        let mut set = HashSet::new();
        self.collect_symbols(&mut set);
        set
    }

    fn collect_symbols(&self, set: &mut HashSet<String>) {
        match self {
            ParameterExpression::Constant(_) | ParameterExpression::Pi => {}
            ParameterExpression::Symbol(name) => {
                set.insert(name.clone());
            }
            ParameterExpression::Neg(e) => e.collect_symbols(set),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b) => {
                a.collect_symbols(set);
                b.collect_symbols(set);
            }
        }
    }

    /// Check whether `name` occurs anywhere in this expression.
    pub fn depends_on(&self, name: &str) -> bool {
        match self {
            ParameterExpression::Symbol(n) => n == name,
            ParameterExpression::Constant(_) | ParameterExpression::Pi => false,
            ParameterExpression::Neg(e) => e.depends_on(name),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b) => a.depends_on(name) || b.depends_on(name),
        }
    }

    /// Evaluate the expression with every symbol looked up in `resolver`.
    ///
    /// Division by zero is not guarded and yields `inf`/`NaN`.
    pub fn evaluate(&self, resolver: &ParameterResolver<'_>) -> IrResult<f64> {
        Ok(match self {
            ParameterExpression::Constant(v) => *v,
            ParameterExpression::Symbol(name) => resolver.value(name)?,
            ParameterExpression::Pi => PI,
            ParameterExpression::Neg(e) => -e.evaluate(resolver)?,
            ParameterExpression::Add(a, b) => a.evaluate(resolver)? + b.evaluate(resolver)?,
            ParameterExpression::Sub(a, b) => a.evaluate(resolver)? - b.evaluate(resolver)?,
            ParameterExpression::Mul(a, b) => a.evaluate(resolver)? * b.evaluate(resolver)?,
            ParameterExpression::Div(a, b) => a.evaluate(resolver)? / b.evaluate(resolver)?,
        })
    }

    /// Exact partial derivative `∂self/∂symbol` at the point given by `resolver`.
    ///
    /// Each occurrence of `symbol` contributes its own term, so `gamma * gamma`
    /// differentiates to `2 * gamma`.
    pub fn partial(&self, symbol: &str, resolver: &ParameterResolver<'_>) -> IrResult<f64> {
        if !self.depends_on(symbol) {
            return Ok(0.0);
        }
        Ok(match self {
            ParameterExpression::Constant(_) | ParameterExpression::Pi => 0.0,
            ParameterExpression::Symbol(_) => 1.0,
            ParameterExpression::Neg(e) => -e.partial(symbol, resolver)?,
            ParameterExpression::Add(a, b) => {
                a.partial(symbol, resolver)? + b.partial(symbol, resolver)?
            }
            ParameterExpression::Sub(a, b) => {
                a.partial(symbol, resolver)? - b.partial(symbol, resolver)?
            }
            ParameterExpression::Mul(a, b) => {
                a.partial(symbol, resolver)? * b.evaluate(resolver)?
                    + a.evaluate(resolver)? * b.partial(symbol, resolver)?
            }
            ParameterExpression::Div(a, b) => {
                let bv = b.evaluate(resolver)?;
                let da = a.partial(symbol, resolver)?;
                let db = b.partial(symbol, resolver)?;
                (da * bv - a.evaluate(resolver)? * db) / (bv * bv)
            }
        })
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterExpression::Constant(v) => write!(f, "{v}"),
            ParameterExpression::Symbol(name) => write!(f, "{name}"),
            ParameterExpression::Pi => write!(f, "π"),
            ParameterExpression::Neg(e) => write!(f, "-({e})"),
            ParameterExpression::Add(a, b) => write!(f, "({a} + {b})"),
            ParameterExpression::Sub(a, b) => write!(f, "({a} - {b})"),
            ParameterExpression::Mul(a, b) => write!(f, "({a} * {b})"),
            ParameterExpression::Div(a, b) => write!(f, "({a} / {b})"),
        }
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }
}

impl From<i32> for ParameterExpression {
    fn from(value: i32) -> Self {
        ParameterExpression::Constant(f64::from(value))
    }
}

impl From<&str> for ParameterExpression {
    fn from(name: &str) -> Self {
        ParameterExpression::Symbol(name.to_string())
    }
}

impl std::ops::Add for ParameterExpression {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        ParameterExpression::Add(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for ParameterExpression {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        ParameterExpression::Sub(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for ParameterExpression {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        ParameterExpression::Mul(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Div for ParameterExpression {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        ParameterExpression::Div(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Neg for ParameterExpression {
    type Output = Self;

    fn neg(self) -> Self::Output {
        ParameterExpression::Neg(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::SymbolTable;
    use approx::assert_relative_eq;

    fn sym(name: &str) -> ParameterExpression {
        ParameterExpression::symbol(name)
    }

    #[test]
    fn test_constant() {
        let p = ParameterExpression::constant(1.5);
        assert!(!p.is_symbolic());
        assert!(p.symbols().is_empty());
    }

    #[test]
    fn test_symbol() {
        let p = sym("theta");
        assert!(p.is_symbolic());
        assert!(p.symbols().contains("theta"));
    }

    #[test]
    fn test_evaluate_against_table() {
        let table = SymbolTable::new(["a", "b"]).unwrap();
        let values = [2.0, 5.0];
        let resolver = table.resolver(&values).unwrap();

        let expr = sym("a") * sym("b") + ParameterExpression::constant(1.0);
        assert_relative_eq!(expr.evaluate(&resolver).unwrap(), 11.0);
    }

    #[test]
    fn test_evaluate_unresolved_symbol() {
        let table = SymbolTable::new(["a"]).unwrap();
        let values = [1.0];
        let resolver = table.resolver(&values).unwrap();

        let err = sym("missing").evaluate(&resolver).unwrap_err();
        assert!(matches!(err, crate::IrError::UnresolvedSymbol(name) if name == "missing"));
    }

    #[test]
    fn test_partial_of_product_counts_each_occurrence() {
        let table = SymbolTable::new(["gamma"]).unwrap();
        let values = [0.789];
        let resolver = table.resolver(&values).unwrap();

        let square = sym("gamma") * sym("gamma");
        assert_relative_eq!(square.partial("gamma", &resolver).unwrap(), 2.0 * 0.789);
    }

    #[test]
    fn test_partial_quotient_rule() {
        let table = SymbolTable::new(["x", "y"]).unwrap();
        let values = [3.0, 2.0];
        let resolver = table.resolver(&values).unwrap();

        let ratio = sym("x") / sym("y");
        assert_relative_eq!(ratio.partial("x", &resolver).unwrap(), 0.5);
        assert_relative_eq!(ratio.partial("y", &resolver).unwrap(), -3.0 / 4.0);
    }

    #[test]
    fn test_partial_independent_symbol_is_zero() {
        let table = SymbolTable::new(["x", "y"]).unwrap();
        let values = [3.0, 2.0];
        let resolver = table.resolver(&values).unwrap();

        let expr = -(ParameterExpression::scaled_symbol(0.5, "x") - ParameterExpression::pi());
        assert_relative_eq!(expr.partial("y", &resolver).unwrap(), 0.0);
        assert_relative_eq!(expr.partial("x", &resolver).unwrap(), -0.5);
    }
}
