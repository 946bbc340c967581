//! Offline replay of ledger scripts.

pub mod report;
pub mod script;

pub use report::{BalanceLine, Counterparty, Rejection, Report};
pub use script::{Operation, Script, ShareInput};

use splitledger_core::DomainResult;
use splitledger_ledger::{LedgerConfig, LedgerStore};

/// Replay `script` on a fresh store and report the resulting state.
///
/// Members listed in the script replace the configured roster. Rejected operations
/// are collected, not fatal; only a bad roster fails the replay.
pub fn replay(script: &Script, config: &LedgerConfig) -> DomainResult<Report> {
    let mut config = config.clone();
    if !script.members.is_empty() {
        config.members = script.members.clone();
    }

    let mut store = LedgerStore::from_config(&config)?;
    let mut rejected = Vec::new();

    for (index, op) in script.operations.iter().enumerate() {
        if let Err(err) = op.apply(&mut store) {
            tracing::info!(index, op = op.name(), error = %err, "operation rejected");
            rejected.push(Rejection {
                index,
                op: op.name(),
                error: err.message().to_string(),
            });
        }
    }

    tracing::debug!(
        users = store.users().len(),
        expenses = store.expenses().len(),
        rejected = rejected.len(),
        "replay finished"
    );

    Ok(Report::build(&store, rejected))
}
