//! # CLI Interface
//!
//! Defines the command-line argument structure for `presentproof-node`
//! using `clap` derive. Supports two subcommands: `run` and `version`.

use clap::{Parser, Subcommand, ValueEnum};

/// Present-proof exchange runner.
///
/// Starts a Verifier and a Prover agent in one process, connects them
/// through an in-memory DIDComm transport, and drives a batch of
/// present-proof conversations between them.
#[derive(Parser, Debug)]
#[command(
    name = "presentproof-node",
    about = "Runs present-proof exchanges between two in-process agents",
    version,
    propagate_version = true
)]
pub struct PresentProofNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a batch of conversations and print a JSON report.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// How the Prover answers each request.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    /// Present a valid, signed presentation straight away.
    Accept,
    /// Counter-propose first, then present once the request is re-issued.
    Propose,
    /// Present a presentation whose content was altered after signing.
    Tamper,
    /// Decline the request.
    Reject,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Prover behavior to exercise.
    #[arg(long, short = 's', value_enum, default_value_t = Scenario::Accept)]
    pub scenario: Scenario,

    /// Number of conversations to run concurrently.
    #[arg(long, short = 'n', env = "PRESENTPROOF_CONVERSATIONS", default_value_t = 1)]
    pub conversations: usize,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "PRESENTPROOF_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(
        long,
        env = "PRESENTPROOF_LOG_LEVEL",
        default_value = "presentproof_node=info,presentproof_protocol=info"
    )]
    pub log_level: String,

    /// Hex-encoded 32-byte seed for the Verifier's key.
    ///
    /// A fresh key is generated when omitted.
    #[arg(long, env = "PRESENTPROOF_VERIFIER_SEED")]
    pub verifier_seed: Option<String>,

    /// Hex-encoded 32-byte seed for the Prover's signing key.
    ///
    /// A fresh key is generated when omitted.
    #[arg(long, env = "PRESENTPROOF_PROVER_SEED")]
    pub prover_seed: Option<String>,

    /// Give up waiting for conversations to settle after this many
    /// milliseconds.
    #[arg(long, env = "PRESENTPROOF_TIMEOUT_MS", default_value_t = 10_000)]
    pub timeout_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        PresentProofNodeCli::command().debug_assert();
    }

    #[test]
    fn run_defaults() {
        let cli = PresentProofNodeCli::try_parse_from(["presentproof-node", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.scenario, Scenario::Accept);
        assert_eq!(args.conversations, 1);
        assert!(args.prover_seed.is_none());
    }

    #[test]
    fn run_parses_scenario() {
        let cli = PresentProofNodeCli::try_parse_from([
            "presentproof-node",
            "run",
            "--scenario",
            "tamper",
            "-n",
            "5",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.scenario, Scenario::Tamper);
        assert_eq!(args.conversations, 5);
    }
}
