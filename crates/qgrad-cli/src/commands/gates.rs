//! Gates command implementation.

use anyhow::Result;
use console::style;

use qgrad_ir::{Gate, ParameterExpression};

/// Execute the gates command.
pub fn execute() -> Result<()> {
    println!("{} Gate library:\n", style("qgrad").cyan().bold());
    println!(
        "  {:<18} {:>6} {:>10}",
        style("name").bold(),
        style("qubits").bold(),
        style("parameters").bold()
    );

    for name in Gate::NAMES {
        let arity = Gate::arity(name).unwrap_or(0);
        let gate = Gate::from_name(name, vec![ParameterExpression::constant(0.0); arity], 0.0)?;
        println!("  {:<18} {:>6} {:>10}", name, gate.num_qubits(), arity);
    }
    println!();
    println!(
        "  Exponent gates are {} with eigenvalues e^(iπt(λ+s)).",
        style("G^t").yellow()
    );
    Ok(())
}
