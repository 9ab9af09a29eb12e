//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - adjoint gradients for parameterized quantum circuits",
        style("qgrad").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qgrad-ir    Circuit IR, gate library and symbol resolution");
    println!("  qgrad-sim   State-vector simulation and adjoint gradients");
    println!("  qgrad-cli   Command-line interface");
    println!();
    println!("License:    {}", style("Apache-2.0").dim());
}
