//! Symbol tables and parameter resolution.
//!
//! The [`SymbolTable`] fixes the column order shared by the parameter value
//! matrix and the output gradient matrix. A [`ParameterResolver`] binds one
//! row of values to that order.

use rustc_hash::FxHashMap;

use crate::error::{IrError, IrResult};

/// Ordered list of distinct symbol names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    names: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl SymbolTable {
    /// Build a table from names in column order.
    ///
    /// Fails with [`IrError::DuplicateSymbol`] if a name repeats.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> IrResult<Self> {
        let mut table = Self::default();
        for name in names {
            let name = name.into();
            if table.index.contains_key(&name) {
                return Err(IrError::DuplicateSymbol(name));
            }
            table.index.insert(name.clone(), table.names.len());
            table.names.push(name);
        }
        Ok(table)
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if the table has no symbols.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Column of `name`, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Symbol names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Bind a row of values to this table.
    pub fn resolver<'a>(&'a self, values: &'a [f64]) -> IrResult<ParameterResolver<'a>> {
        if values.len() != self.names.len() {
            return Err(IrError::SymbolValueMismatch {
                expected: self.names.len(),
                got: values.len(),
            });
        }
        Ok(ParameterResolver {
            table: self,
            values,
        })
    }
}

/// One row of symbol values, looked up by name.
#[derive(Debug, Clone, Copy)]
pub struct ParameterResolver<'a> {
    table: &'a SymbolTable,
    values: &'a [f64],
}

impl<'a> ParameterResolver<'a> {
    /// Value bound to `name`.
    pub fn value(&self, name: &str) -> IrResult<f64> {
        self.index_of(name).map(|i| self.values[i])
    }

    /// Column of `name`, or [`IrError::UnresolvedSymbol`].
    pub fn index_of(&self, name: &str) -> IrResult<usize> {
        self.table
            .index_of(name)
            .ok_or_else(|| IrError::UnresolvedSymbol(name.to_string()))
    }

    /// The table this resolver is bound to.
    pub fn table(&self) -> &'a SymbolTable {
        self.table
    }

    /// The bound values in column order.
    pub fn values(&self) -> &'a [f64] {
        self.values
    }
}
