//! CLI argument parsing tests.
//!
//! The CLI is a binary crate, so parsing is checked on equivalent clap
//! structs. Batch-file loading is covered by the unit tests in
//! `src/commands/common.rs`.

// ============================================================================
// Clap argument parsing (test via try_parse_from on equivalent structs)
// ============================================================================

mod clap_parsing {
    use clap::{Parser, Subcommand};

    #[derive(Parser, Debug)]
    #[command(name = "qgrad")]
    struct TestCli {
        #[arg(short, long, action = clap::ArgAction::Count, global = true)]
        verbose: u8,

        #[command(subcommand)]
        command: TestCommands,
    }

    #[derive(Subcommand, Debug)]
    enum TestCommands {
        Grad {
            #[arg(short, long)]
            input: String,
            #[arg(short, long)]
            output: Option<String>,
            #[arg(short, long)]
            config: Option<String>,
            #[arg(short, long)]
            threads: Option<usize>,
            #[arg(long)]
            retention: Option<String>,
            #[arg(long)]
            fused: bool,
            #[arg(long)]
            skip_failures: bool,
        },
        Expect {
            #[arg(short, long)]
            input: String,
            #[arg(short, long)]
            output: Option<String>,
        },
        Gates,
        Version,
    }

    #[test]
    fn test_parse_grad_minimal() {
        let cli = TestCli::try_parse_from(["qgrad", "grad", "-i", "batch.json"]).unwrap();
        match cli.command {
            TestCommands::Grad {
                input,
                output,
                threads,
                fused,
                skip_failures,
                ..
            } => {
                assert_eq!(input, "batch.json");
                assert!(output.is_none());
                assert!(threads.is_none());
                assert!(!fused);
                assert!(!skip_failures);
            }
            other => panic!("expected grad, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_grad_all_args() {
        let cli = TestCli::try_parse_from([
            "qgrad",
            "-vv",
            "grad",
            "-i",
            "batch.json",
            "-o",
            "out.json",
            "-c",
            "qgrad.yaml",
            "-t",
            "4",
            "--retention",
            "cache",
            "--fused",
            "--skip-failures",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            TestCommands::Grad {
                output,
                config,
                threads,
                retention,
                fused,
                skip_failures,
                ..
            } => {
                assert_eq!(output.as_deref(), Some("out.json"));
                assert_eq!(config.as_deref(), Some("qgrad.yaml"));
                assert_eq!(threads, Some(4));
                assert_eq!(retention.as_deref(), Some("cache"));
                assert!(fused);
                assert!(skip_failures);
            }
            other => panic!("expected grad, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_grad_missing_input() {
        assert!(TestCli::try_parse_from(["qgrad", "grad"]).is_err());
    }

    #[test]
    fn test_parse_bad_thread_count() {
        assert!(TestCli::try_parse_from(["qgrad", "grad", "-i", "b.json", "-t", "many"]).is_err());
    }

    #[test]
    fn test_parse_expect() {
        let cli = TestCli::try_parse_from(["qgrad", "expect", "-i", "b.json", "-o", "e.json"])
            .unwrap();
        match cli.command {
            TestCommands::Expect { input, output } => {
                assert_eq!(input, "b.json");
                assert_eq!(output.as_deref(), Some("e.json"));
            }
            other => panic!("expected expect, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_gates_and_version() {
        assert!(matches!(
            TestCli::try_parse_from(["qgrad", "gates"]).unwrap().command,
            TestCommands::Gates
        ));
        assert!(matches!(
            TestCli::try_parse_from(["qgrad", "version"]).unwrap().command,
            TestCommands::Version
        ));
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(TestCli::try_parse_from(["qgrad", "compile"]).is_err());
    }
}
