//! Replay scripts: a JSON list of ledger operations referring to members by email.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use splitledger_core::{DomainError, DomainResult, UserId};
use splitledger_ledger::{
    Category, LedgerStore, MemberSeed, NewExpense, ParticipantShare, Split, SplitMode,
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Script {
    /// Initial roster; when empty, the configured members are used.
    #[serde(default)]
    pub members: Vec<MemberSeed>,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareInput {
    pub email: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    AddUser {
        name: String,
        email: String,
    },
    RemoveUser {
        email: String,
    },
    AddExpense {
        description: String,
        amount: f64,
        paid_by: String,
        split: SplitMode,
        /// Emails, for `equal` splits.
        #[serde(default)]
        participants: Vec<String>,
        /// Explicit amounts, for `custom` splits.
        #[serde(default)]
        shares: Vec<ShareInput>,
        category: String,
        #[serde(default)]
        date: Option<NaiveDate>,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::AddUser { .. } => "add_user",
            Operation::RemoveUser { .. } => "remove_user",
            Operation::AddExpense { .. } => "add_expense",
        }
    }

    /// Run this operation against the store.
    pub fn apply(&self, store: &mut LedgerStore) -> DomainResult<()> {
        match self {
            Operation::AddUser { name, email } => {
                store.add_user(name, email)?;
            }
            Operation::RemoveUser { email } => {
                let user_id = member(store, email)?;
                store.remove_user(user_id)?;
            }
            Operation::AddExpense {
                description,
                amount,
                paid_by,
                split,
                participants,
                shares,
                category,
                date,
            } => {
                let split = match split {
                    SplitMode::Equal => Split::Equal(
                        participants
                            .iter()
                            .map(|email| member(store, email))
                            .collect::<DomainResult<_>>()?,
                    ),
                    SplitMode::Custom => Split::Custom(
                        shares
                            .iter()
                            .map(|s| -> DomainResult<ParticipantShare> {
                                Ok(ParticipantShare::new(member(store, &s.email)?, s.amount))
                            })
                            .collect::<DomainResult<_>>()?,
                    ),
                };

                let paid_by = member(store, paid_by)?;
                let category = category.parse::<Category>()?;

                store.add_expense(NewExpense {
                    description: description.clone(),
                    amount: *amount,
                    paid_by,
                    split,
                    category,
                    date: date.unwrap_or_else(|| Utc::now().date_naive()),
                })?;
            }
        }
        Ok(())
    }
}

/// Resolve a member by email (case-insensitive, first match).
fn member(store: &LedgerStore, email: &str) -> DomainResult<UserId> {
    let wanted = email.trim();
    store
        .users()
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(wanted))
        .map(|u| u.id)
        .ok_or_else(|| DomainError::validation(format!("unknown member: {wanted}")))
}
