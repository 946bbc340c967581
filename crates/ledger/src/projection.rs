//! Balances read model built from the store's event stream.
//!
//! Lets a collaborator keep its own copy of users, expenses and balances by
//! subscribing to a [`LedgerStore`](crate::LedgerStore) instead of querying it.

use splitledger_core::{Aggregate, AggregateId};
use splitledger_events::{EventEnvelope, Projection};

use crate::balance::{Balance, compute_balances};
use crate::expense::Expense;
use crate::ledger::{Ledger, LedgerEvent, LedgerId};
use crate::user::User;

#[derive(Debug, Clone)]
pub struct BalancesProjection {
    replica: Ledger,
    balances: Vec<Balance>,
}

impl BalancesProjection {
    pub fn new(ledger_id: LedgerId) -> Self {
        Self {
            replica: Ledger::empty(ledger_id),
            balances: Vec::new(),
        }
    }

    pub fn users(&self) -> &[User] {
        self.replica.users()
    }

    pub fn expenses(&self) -> &[Expense] {
        self.replica.expenses()
    }

    pub fn balances(&self) -> &[Balance] {
        &self.balances
    }
}

impl Default for BalancesProjection {
    fn default() -> Self {
        Self::new(LedgerId::new(AggregateId::new()))
    }
}

impl Projection for BalancesProjection {
    type Ev = LedgerEvent;

    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>) {
        self.replica.apply(envelope.payload());
        self.balances = compute_balances(self.replica.users(), self.replica.expenses());
    }
}
