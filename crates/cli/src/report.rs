//! JSON report of ledger state after a replay.

use std::collections::BTreeMap;

use serde::Serialize;

use splitledger_core::UserId;
use splitledger_ledger::{Expense, LedgerStore, LedgerSummary, User};

/// An operation the ledger refused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    /// Zero-based position in the script.
    pub index: usize,
    pub op: &'static str,
    pub error: String,
}

/// One side of a pairwise debt. Names may repeat; emails tell members apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Counterparty {
    pub name: String,
    pub email: String,
    pub amount: f64,
}

/// A balance with counterparties resolved to members.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceLine {
    pub name: String,
    pub email: String,
    pub owes: Vec<Counterparty>,
    pub owed_by: Vec<Counterparty>,
    pub net_balance: f64,
    pub settled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub summary: LedgerSummary,
    pub users: Vec<User>,
    /// Newest first.
    pub expenses: Vec<Expense>,
    pub balances: Vec<BalanceLine>,
    pub rejected: Vec<Rejection>,
}

impl Report {
    pub fn build(store: &LedgerStore, rejected: Vec<Rejection>) -> Self {
        let counterparties = |debts: &BTreeMap<UserId, f64>| -> Vec<Counterparty> {
            debts
                .iter()
                .map(|(id, amount)| {
                    let (name, email) = match store.user(*id) {
                        Some(u) => (u.name.clone(), u.email.clone()),
                        None => ("Unknown User".to_string(), String::new()),
                    };
                    Counterparty {
                        name,
                        email,
                        amount: round2(*amount),
                    }
                })
                .collect()
        };

        let balances = store
            .balances()
            .iter()
            .filter_map(|balance| {
                let user = store.user(balance.user_id)?;
                Some(BalanceLine {
                    name: user.name.clone(),
                    email: user.email.clone(),
                    owes: counterparties(&balance.owes),
                    owed_by: counterparties(&balance.owed_by),
                    net_balance: round2(balance.net_balance),
                    settled: balance.is_settled(),
                })
            })
            .collect();

        Self {
            summary: store.summary(),
            users: store.users().to_vec(),
            expenses: store.expenses_newest_first().cloned().collect(),
            balances,
            rejected,
        }
    }
}

fn round2(value: f64) -> f64 {
    let rounded = splitledger_ledger::split::round_to_cents(value);
    // Avoid printing -0.0
    if rounded == 0.0 { 0.0 } else { rounded }
}
