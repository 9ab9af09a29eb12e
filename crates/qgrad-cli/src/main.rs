//! qgrad Command-Line Interface
//!
//! Batch expectation values and adjoint gradients for parameterized circuits
//! stored as JSON.
//!
//! ```text
//! qgrad grad   -i batch.json [-o grads.json] [-c qgrad.yaml] [-t 8] [--fused]
//! qgrad expect -i batch.json [-o values.json]
//! qgrad gates
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{expect, gates, grad, version};

/// qgrad - adjoint gradients for parameterized quantum circuits
#[derive(Parser)]
#[command(name = "qgrad")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the gradient of weighted expectations for a batch of circuits
    Grad {
        /// Input batch file (JSON)
        #[arg(short, long)]
        input: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Engine configuration (YAML)
        #[arg(short, long, env = "QGRAD_CONFIG")]
        config: Option<String>,

        /// Worker threads
        #[arg(short, long)]
        threads: Option<usize>,

        /// Pre-state strategy (recompute, cache)
        #[arg(long)]
        retention: Option<String>,

        /// Sweep once per circuit with a weighted co-state
        #[arg(long)]
        fused: bool,

        /// Zero failing rows instead of aborting
        #[arg(long)]
        skip_failures: bool,
    },

    /// Compute expectation values for a batch of circuits
    Expect {
        /// Input batch file (JSON)
        #[arg(short, long)]
        input: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Engine configuration (YAML)
        #[arg(short, long, env = "QGRAD_CONFIG")]
        config: Option<String>,

        /// Worker threads
        #[arg(short, long)]
        threads: Option<usize>,

        /// Zero failing rows instead of aborting
        #[arg(long)]
        skip_failures: bool,
    },

    /// List the gate library
    Gates,

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the JSON report.
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Grad {
            input,
            output,
            config,
            threads,
            retention,
            fused,
            skip_failures,
        } => grad::execute(
            &input,
            output.as_deref(),
            config.as_deref(),
            threads,
            retention.as_deref(),
            fused,
            skip_failures,
        ),

        Commands::Expect {
            input,
            output,
            config,
            threads,
            skip_failures,
        } => expect::execute(
            &input,
            output.as_deref(),
            config.as_deref(),
            threads,
            skip_failures,
        ),

        Commands::Gates => gates::execute(),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
