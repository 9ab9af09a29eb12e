//! CLI command implementations.

pub mod common;
pub mod expect;
pub mod gates;
pub mod grad;
pub mod version;
