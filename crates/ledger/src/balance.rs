//! Balance engine: derives pairwise debts and net positions from the expense list.
//!
//! Balances are a pure function of `(users, expenses)`. They are recomputed from
//! scratch whenever either collection changes and are never patched in place.
//!
//! Debts between a pair accumulate per direction: if A owes B from one expense and
//! B owes A from another, both entries are kept. Nothing is netted or simplified.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use splitledger_core::UserId;

use crate::expense::Expense;
use crate::user::User;

/// Net positions smaller than this are shown as settled.
pub const SETTLED_THRESHOLD: f64 = 0.01;

/// Derived balance for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub user_id: UserId,
    /// Creditor id -> amount this user owes them.
    pub owes: BTreeMap<UserId, f64>,
    /// Debtor id -> amount they owe this user.
    pub owed_by: BTreeMap<UserId, f64>,
    /// `sum(owed_by) - sum(owes)`; positive means net creditor.
    pub net_balance: f64,
}

impl Balance {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            owes: BTreeMap::new(),
            owed_by: BTreeMap::new(),
            net_balance: 0.0,
        }
    }

    /// Total other users owe this user.
    pub fn credit(&self) -> f64 {
        self.owed_by.values().sum()
    }

    /// Total this user owes other users.
    pub fn debt(&self) -> f64 {
        self.owes.values().sum()
    }

    pub fn is_settled(&self) -> bool {
        self.net_balance.abs() < SETTLED_THRESHOLD
    }

    /// Whether this balance mentions `user_id` as a counterparty.
    pub fn mentions(&self, user_id: UserId) -> bool {
        self.owes.contains_key(&user_id) || self.owed_by.contains_key(&user_id)
    }
}

/// Compute one balance per user, in user order.
///
/// For every share whose participant is not the payer, the payer is owed the share
/// amount by that participant. Self-shares contribute nothing. Shares naming users
/// that are not in `users` are skipped.
pub fn compute_balances(users: &[User], expenses: &[Expense]) -> Vec<Balance> {
    let mut balances: Vec<Balance> = users.iter().map(|u| Balance::new(u.id)).collect();
    let index: HashMap<UserId, usize> = users
        .iter()
        .enumerate()
        .map(|(i, u)| (u.id, i))
        .collect();

    for expense in expenses {
        let payer = expense.paid_by;
        let Some(&payer_idx) = index.get(&payer) else {
            continue;
        };

        for share in expense.participants.iter().filter(|s| s.user_id != payer) {
            let Some(&participant_idx) = index.get(&share.user_id) else {
                continue;
            };

            *balances[payer_idx]
                .owed_by
                .entry(share.user_id)
                .or_insert(0.0) += share.amount;
            *balances[participant_idx]
                .owes
                .entry(payer)
                .or_insert(0.0) += share.amount;
        }
    }

    for balance in &mut balances {
        balance.net_balance = balance.credit() - balance.debt();
    }

    balances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::{Category, ParticipantShare, SplitMode};
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;
    use splitledger_core::ExpenseId;

    fn user(name: &str) -> User {
        User::new(UserId::new(), name, &format!("{}@example.com", name.to_lowercase())).unwrap()
    }

    fn expense(paid_by: UserId, shares: &[(UserId, f64)]) -> Expense {
        Expense {
            id: ExpenseId::new(),
            description: "test".to_string(),
            amount: shares.iter().map(|(_, a)| a).sum(),
            paid_by,
            split_mode: SplitMode::Custom,
            participants: shares
                .iter()
                .map(|&(id, amount)| ParticipantShare::new(id, amount))
                .collect(),
            category: Category::Other,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn dinner_paid_by_one_of_three() {
        let (a, b, c) = (user("A"), user("B"), user("C"));
        let users = vec![a.clone(), b.clone(), c.clone()];
        let dinner = expense(a.id, &[(a.id, 30.0), (b.id, 30.0), (c.id, 30.0)]);

        let balances = compute_balances(&users, &[dinner]);

        assert_eq!(balances[0].owed_by, BTreeMap::from([(b.id, 30.0), (c.id, 30.0)]));
        assert!(balances[0].owes.is_empty());
        assert_eq!(balances[0].net_balance, 60.0);

        assert_eq!(balances[1].owes, BTreeMap::from([(a.id, 30.0)]));
        assert_eq!(balances[1].net_balance, -30.0);
        assert_eq!(balances[2].owes, BTreeMap::from([(a.id, 30.0)]));
        assert_eq!(balances[2].net_balance, -30.0);
    }

    #[test]
    fn opposite_debts_between_a_pair_are_not_netted() {
        let (a, b) = (user("A"), user("B"));
        let users = vec![a.clone(), b.clone()];
        let expenses = vec![
            expense(a.id, &[(b.id, 20.0)]),
            expense(b.id, &[(a.id, 5.0)]),
        ];

        let balances = compute_balances(&users, &expenses);

        assert_eq!(balances[0].owed_by.get(&b.id), Some(&20.0));
        assert_eq!(balances[0].owes.get(&b.id), Some(&5.0));
        assert_eq!(balances[0].net_balance, 15.0);
        assert_eq!(balances[1].net_balance, -15.0);
    }

    #[test]
    fn repeated_expenses_accumulate() {
        let (a, b) = (user("A"), user("B"));
        let users = vec![a.clone(), b.clone()];
        let expenses = vec![
            expense(a.id, &[(a.id, 10.0), (b.id, 10.0)]),
            expense(a.id, &[(b.id, 12.5)]),
        ];

        let balances = compute_balances(&users, &expenses);

        assert_eq!(balances[1].owes.get(&a.id), Some(&22.5));
        assert_eq!(balances[1].debt(), 22.5);
        assert_eq!(balances[0].credit(), 22.5);
    }

    #[test]
    fn self_paid_expense_is_settled() {
        let a = user("A");
        let balances = compute_balances(&[a.clone()], &[expense(a.id, &[(a.id, 42.0)])]);

        assert!(balances[0].owes.is_empty());
        assert!(balances[0].owed_by.is_empty());
        assert!(balances[0].is_settled());
    }

    #[test]
    fn unknown_users_are_skipped() {
        let (a, b) = (user("A"), user("B"));
        let ghost = UserId::new();
        let users = vec![a.clone(), b.clone()];
        let expenses = vec![
            expense(ghost, &[(a.id, 10.0)]),
            expense(a.id, &[(ghost, 10.0), (b.id, 4.0)]),
        ];

        let balances = compute_balances(&users, &expenses);

        assert!(balances.iter().all(|bal| !bal.mentions(ghost)));
        assert_eq!(balances[0].net_balance, 4.0);
    }

    #[test]
    fn every_user_gets_a_balance_even_without_expenses() {
        let users = vec![user("A"), user("B")];
        let balances = compute_balances(&users, &[]);

        assert_eq!(balances.len(), 2);
        assert!(balances.iter().all(Balance::is_settled));
    }

    fn scenario() -> impl Strategy<Value = (usize, Vec<(usize, Vec<(usize, u32)>)>)> {
        (1usize..6).prop_flat_map(|n| {
            let share = (0..n, 0u32..100_000);
            let expense = (0..n, prop::collection::vec(share, 1..6));
            (Just(n), prop::collection::vec(expense, 0..20))
        })
    }

    fn materialize(
        n: usize,
        raw: &[(usize, Vec<(usize, u32)>)],
    ) -> (Vec<User>, Vec<Expense>) {
        let users: Vec<User> = (0..n).map(|i| user(&format!("U{i}"))).collect();
        let expenses = raw
            .iter()
            .map(|(payer, shares)| {
                let shares: Vec<(UserId, f64)> = shares
                    .iter()
                    .map(|&(who, cents)| (users[who].id, cents as f64 / 100.0))
                    .collect();
                expense(users[*payer].id, &shares)
            })
            .collect();
        (users, expenses)
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: what creditors are owed equals what debtors owe.
        #[test]
        fn net_balances_sum_to_zero((n, raw) in scenario()) {
            let (users, expenses) = materialize(n, &raw);
            let balances = compute_balances(&users, &expenses);

            let total: f64 = balances.iter().map(|b| b.net_balance).sum();
            prop_assert!(total.abs() < 1e-6);
        }

        /// Property: recomputing over the same snapshot gives identical balances.
        #[test]
        fn recomputation_is_idempotent((n, raw) in scenario()) {
            let (users, expenses) = materialize(n, &raw);

            prop_assert_eq!(
                compute_balances(&users, &expenses),
                compute_balances(&users, &expenses)
            );
        }

        /// Property: every pairwise debt is mirrored by the counterparty's credit.
        #[test]
        fn pairwise_entries_mirror_each_other((n, raw) in scenario()) {
            let (users, expenses) = materialize(n, &raw);
            let balances = compute_balances(&users, &expenses);

            for debtor in &balances {
                for (creditor, amount) in &debtor.owes {
                    let creditor_balance = balances.iter().find(|b| b.user_id == *creditor).unwrap();
                    prop_assert_eq!(creditor_balance.owed_by.get(&debtor.user_id), Some(amount));
                }
            }
        }
    }
}
