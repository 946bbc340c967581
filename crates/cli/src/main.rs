//! `splitledger`: replay a ledger script and print the resulting state as JSON.
//!
//! ```bash
//! splitledger weekend.json
//! splitledger --strict --pretty-logs - < weekend.json
//! ```

use std::io::Read;

use anyhow::{Context, bail};
use clap::Parser;

use splitledger_cli::{Script, replay};
use splitledger_ledger::LedgerConfig;
use splitledger_observability::tracing::LogFormat;

/// Replay a JSON script of ledger operations and report balances.
#[derive(Debug, Parser)]
#[command(name = "splitledger", version)]
struct Args {
    /// Fail when any operation is rejected
    #[arg(long)]
    strict: bool,

    /// Human-readable logs instead of JSON
    #[arg(long)]
    pretty_logs: bool,

    /// Script path, or `-` for stdin
    script: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.pretty_logs {
        splitledger_observability::tracing::init(LogFormat::Pretty);
    } else {
        splitledger_observability::init();
    }

    let raw = read_script(&args.script)?;
    let script: Script =
        serde_json::from_str(&raw).with_context(|| format!("invalid script {}", args.script))?;

    let config = LedgerConfig::from_env();
    let report = replay(&script, &config).context("failed to seed members")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to encode report")?
    );

    if args.strict && !report.rejected.is_empty() {
        bail!("{} operation(s) rejected", report.rejected.len());
    }

    tracing::info!(operations = script.operations.len(), "replay complete");
    Ok(())
}

fn read_script(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read script from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
}
