//! Ledger store: the in-process API the presentation layer talks to.
//!
//! ```text
//! add_user / remove_user / add_expense
//!   ↓
//! 1. Build a command (fresh ids, timestamps, split shares)
//!   ↓
//! 2. Ledger::handle validates (no mutation on failure)
//!   ↓
//! 3. Ledger::apply commits the events
//!   ↓
//! 4. Balances recomputed from scratch
//!   ↓
//! 5. Events published to subscribers as envelopes
//! ```
//!
//! Reads after a successful mutation always see balances for that mutation.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use splitledger_core::{AggregateId, AggregateRoot, DomainError, DomainResult, ExpenseId, UserId};
use splitledger_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription, execute};

use crate::balance::{Balance, compute_balances};
use crate::config::LedgerConfig;
use crate::expense::{Category, Expense, ParticipantShare};
use crate::ledger::{
    AddExpense, AddUser, Ledger, LedgerCommand, LedgerEvent, LedgerId, RemoveUser,
};
use crate::split::{Split, custom_split, equal_split};
use crate::user::User;

/// Aggregate type recorded on every envelope.
pub const AGGREGATE_TYPE: &str = "ledger";

pub type LedgerEnvelope = EventEnvelope<LedgerEvent>;

/// Input for [`LedgerStore::add_expense`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub description: String,
    pub amount: f64,
    pub paid_by: UserId,
    pub split: Split,
    pub category: Category,
    pub date: NaiveDate,
}

/// Headline figures for the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total_spent: f64,
    pub expense_count: usize,
    pub member_count: usize,
    /// Net balance of the earliest member still in the group, the overview's "your balance".
    pub first_member_net: Option<f64>,
}

/// Owner of users and expenses, with balances kept in sync.
#[derive(Debug)]
pub struct LedgerStore<B = InMemoryEventBus<LedgerEnvelope>> {
    ledger: Ledger,
    balances: Vec<Balance>,
    bus: B,
    sequence: u64,
}

impl LedgerStore {
    /// Empty store with the default tolerance and an in-memory bus.
    pub fn new() -> Self {
        Self::with_bus(LedgerConfig::default().split_tolerance, InMemoryEventBus::new())
    }

    /// Store seeded with the configured members.
    pub fn from_config(config: &LedgerConfig) -> DomainResult<Self> {
        let mut store = Self::with_bus(config.split_tolerance, InMemoryEventBus::new());
        for member in &config.members {
            store.add_user(&member.name, &member.email)?;
        }
        Ok(store)
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> LedgerStore<B>
where
    B: EventBus<LedgerEnvelope>,
{
    pub fn with_bus(split_tolerance: f64, bus: B) -> Self {
        let ledger_id = LedgerId::new(AggregateId::new());
        Self {
            ledger: Ledger::with_tolerance(ledger_id, split_tolerance),
            balances: Vec::new(),
            bus,
            sequence: 0,
        }
    }

    pub fn id(&self) -> LedgerId {
        self.ledger.id_typed()
    }

    /// Members in insertion order.
    pub fn users(&self) -> &[User] {
        self.ledger.users()
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.ledger.user(id)
    }

    /// Expenses in insertion order.
    pub fn expenses(&self) -> &[Expense] {
        self.ledger.expenses()
    }

    pub fn expense(&self, id: ExpenseId) -> Option<&Expense> {
        self.ledger.expense(id)
    }

    pub fn expenses_newest_first(&self) -> impl Iterator<Item = &Expense> + '_ {
        self.ledger.expenses().iter().rev()
    }

    pub fn recent_expenses(&self, limit: usize) -> Vec<&Expense> {
        self.expenses_newest_first().take(limit).collect()
    }

    /// Balances for every member, in member order.
    pub fn balances(&self) -> &[Balance] {
        &self.balances
    }

    pub fn balance_for(&self, id: UserId) -> Option<&Balance> {
        self.balances.iter().find(|b| b.user_id == id)
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            total_spent: self.expenses().iter().map(|x| x.amount).sum(),
            expense_count: self.expenses().len(),
            member_count: self.users().len(),
            first_member_net: self.balances.first().map(|b| b.net_balance),
        }
    }

    /// Number of events committed so far.
    pub fn version(&self) -> u64 {
        self.ledger.version()
    }

    /// Receive every change committed after this call.
    pub fn subscribe(&self) -> Subscription<LedgerEnvelope> {
        self.bus.subscribe()
    }

    pub fn add_user(&mut self, name: &str, email: &str) -> DomainResult<User> {
        let user_id = UserId::new();
        self.dispatch(LedgerCommand::AddUser(AddUser {
            user_id,
            name: name.to_string(),
            email: email.to_string(),
            occurred_at: Utc::now(),
        }))?;

        let user = self
            .user(user_id)
            .cloned()
            .ok_or_else(|| DomainError::validation("user was not recorded"))?;
        tracing::info!(user_id = %user.id, name = %user.name, "user added");
        Ok(user)
    }

    /// Remove a member and every expense that references them.
    ///
    /// Returns the ids of the cascaded expenses.
    pub fn remove_user(&mut self, user_id: UserId) -> DomainResult<Vec<ExpenseId>> {
        let events = self.dispatch(LedgerCommand::RemoveUser(RemoveUser {
            user_id,
            occurred_at: Utc::now(),
        }))?;

        let removed: Vec<ExpenseId> = events
            .iter()
            .filter_map(|ev| match ev {
                LedgerEvent::UserRemoved(e) => Some(e.removed_expenses.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        tracing::info!(
            user_id = %user_id,
            cascaded = removed.len(),
            "user removed"
        );
        Ok(removed)
    }

    pub fn add_expense(&mut self, new: NewExpense) -> DomainResult<Expense> {
        let split_mode = new.split.mode();
        let participants = self.resolve_split(new.amount, new.split)?;
        let expense_id = ExpenseId::new();

        self.dispatch(LedgerCommand::AddExpense(AddExpense {
            expense_id,
            description: new.description,
            amount: new.amount,
            paid_by: new.paid_by,
            split_mode,
            participants,
            category: new.category,
            date: new.date,
            occurred_at: Utc::now(),
        }))?;

        let expense = self
            .expense(expense_id)
            .cloned()
            .ok_or_else(|| DomainError::validation("expense was not recorded"))?;
        tracing::info!(
            expense_id = %expense.id,
            paid_by = %expense.paid_by,
            amount = expense.amount,
            participants = expense.participants.len(),
            "expense added"
        );
        Ok(expense)
    }

    fn resolve_split(&self, amount: f64, split: Split) -> DomainResult<Vec<ParticipantShare>> {
        match split {
            Split::Equal(participants) => Ok(equal_split(amount, &participants)),
            Split::Custom(shares) => {
                let checked = custom_split(amount, shares, self.ledger.tolerance());
                if checked.mismatch {
                    let err = DomainError::validation(format!(
                        "custom amounts add up to {:.2} but the expense total is {:.2}",
                        checked.assigned, amount
                    ));
                    tracing::warn!("rejected expense: {err}");
                    return Err(err);
                }
                Ok(checked.shares)
            }
        }
    }

    fn dispatch(&mut self, command: LedgerCommand) -> DomainResult<Vec<LedgerEvent>> {
        let events = match execute(&mut self.ledger, &command) {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!("rejected command: {err}");
                return Err(err);
            }
        };

        self.recompute_balances();
        self.publish(&events);
        Ok(events)
    }

    fn recompute_balances(&mut self) {
        self.balances = compute_balances(self.ledger.users(), self.ledger.expenses());
        tracing::debug!(
            users = self.balances.len(),
            expenses = self.ledger.expenses().len(),
            "balances recomputed"
        );
    }

    fn publish(&mut self, events: &[LedgerEvent]) {
        let aggregate_id = self.ledger.id_typed().0;
        for event in events {
            self.sequence += 1;
            let envelope =
                EventEnvelope::record(aggregate_id, AGGREGATE_TYPE, self.sequence, event.clone());
            // The change is already committed; a failed fan-out only affects observers.
            if let Err(err) = self.bus.publish(envelope) {
                tracing::warn!(sequence = self.sequence, "failed to publish ledger event: {err:?}");
            }
        }
    }
}
