// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Present-Proof Node
//!
//! Entry point for the `presentproof-node` binary. Parses CLI arguments,
//! initializes logging, starts a Verifier and a Prover on an in-process
//! transport and runs a batch of present-proof conversations between them.
//!
//! The binary supports two subcommands:
//!
//! - `run`     runs the selected scenario and prints a JSON report
//! - `version` prints build version information

mod agent;
mod cli;
mod logging;
mod loopback;

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;

use presentproof_protocol::crypto::Keypair;

use agent::Parties;
use cli::{Commands, PresentProofNodeCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = PresentProofNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

async fn run(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(&args.log_level, LogFormat::from_str_lossy(&args.log_format));

    let parties = Parties {
        verifier: load_keypair(args.verifier_seed.as_deref()).context("invalid verifier seed")?,
        prover: load_keypair(args.prover_seed.as_deref()).context("invalid prover seed")?,
    };

    let started_at = chrono::Utc::now();
    let report = agent::run_scenario(
        args.scenario,
        args.conversations,
        parties,
        Duration::from_millis(args.timeout_ms),
    )
    .await
    .context("scenario failed")?;

    tracing::info!(
        settled = report.settled,
        acks = report.acks,
        problem_reports = report.problem_reports,
        elapsed_ms = report.elapsed_ms as u64,
        "scenario finished"
    );

    let mut output = report.to_json();
    output["started_at"] = serde_json::json!(started_at.to_rfc3339());
    output["finished_at"] = serde_json::json!(chrono::Utc::now().to_rfc3339());
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("failed to render report")?
    );

    if !report.settled {
        anyhow::bail!(
            "{} of {} conversations did not finish within {} ms",
            report.conversations - report.verifier_done.min(report.prover_done),
            report.conversations,
            args.timeout_ms
        );
    }
    Ok(())
}

/// Key from a hex seed, or a fresh one.
fn load_keypair(seed: Option<&str>) -> Result<Keypair> {
    match seed {
        Some(hex) => Ok(Keypair::from_hex(hex)?),
        None => Ok(Keypair::generate()),
    }
}

fn print_version() {
    println!("presentproof-node {}", env!("CARGO_PKG_VERSION"));
    println!(
        "protocol          {} {}",
        presentproof_protocol::config::PROTOCOL_NAME,
        presentproof_protocol::config::PROTOCOL_VERSION
    );
    println!("rustc             {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
