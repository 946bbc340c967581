use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use splitledger_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, ExpenseId, UserId, find_entity,
    position_of,
};
use splitledger_events::Event;

use crate::expense::{Category, Expense, ParticipantShare, SplitMode};
use crate::split::{SPLIT_TOLERANCE, share_total, within_tolerance};
use crate::user::User;

/// Ledger identifier (aggregate id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerId(pub AggregateId);

impl LedgerId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LedgerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: the group ledger.
///
/// Owns the member roster and the expense list (insertion order). Balances are not
/// held here; they are derived from `users()` and `expenses()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    id: LedgerId,
    users: Vec<User>,
    expenses: Vec<Expense>,
    tolerance: f64,
    version: u64,
}

impl Ledger {
    /// Empty ledger using the default split tolerance.
    pub fn empty(id: LedgerId) -> Self {
        Self::with_tolerance(id, SPLIT_TOLERANCE)
    }

    pub fn with_tolerance(id: LedgerId, tolerance: f64) -> Self {
        Self {
            id,
            users: Vec::new(),
            expenses: Vec::new(),
            tolerance,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> LedgerId {
        self.id
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        find_entity(&self.users, &id)
    }

    pub fn expense(&self, id: ExpenseId) -> Option<&Expense> {
        find_entity(&self.expenses, &id)
    }

    pub fn has_user(&self, id: UserId) -> bool {
        self.user(id).is_some()
    }
}

impl AggregateRoot for Ledger {
    type Id = LedgerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AddUser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddUser {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveUser (cascades to every expense referencing the user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveUser {
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddExpense, with shares already computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddExpense {
    pub expense_id: ExpenseId,
    pub description: String,
    pub amount: f64,
    pub paid_by: UserId,
    pub split_mode: SplitMode,
    pub participants: Vec<ParticipantShare>,
    pub category: Category,
    pub date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerCommand {
    AddUser(AddUser),
    RemoveUser(RemoveUser),
    AddExpense(AddExpense),
}

/// Event: UserAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAdded {
    pub ledger_id: LedgerId,
    pub user: User,
    pub occurred_at: DateTime<Utc>,
}

/// Event: UserRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRemoved {
    pub ledger_id: LedgerId,
    pub user_id: UserId,
    /// Expenses deleted along with the user, in ledger order.
    pub removed_expenses: Vec<ExpenseId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ExpenseAdded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseAdded {
    pub ledger_id: LedgerId,
    pub expense: Expense,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    UserAdded(UserAdded),
    UserRemoved(UserRemoved),
    ExpenseAdded(ExpenseAdded),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::UserAdded(_) => "splitledger.user.added",
            LedgerEvent::UserRemoved(_) => "splitledger.user.removed",
            LedgerEvent::ExpenseAdded(_) => "splitledger.expense.added",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::UserAdded(e) => e.occurred_at,
            LedgerEvent::UserRemoved(e) => e.occurred_at,
            LedgerEvent::ExpenseAdded(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Ledger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::UserAdded(e) => {
                self.id = e.ledger_id;
                self.users.push(e.user.clone());
            }
            LedgerEvent::UserRemoved(e) => {
                if let Some(at) = position_of(&self.users, &e.user_id) {
                    self.users.remove(at);
                }
                self.expenses.retain(|x| !x.references(e.user_id));
            }
            LedgerEvent::ExpenseAdded(e) => {
                self.expenses.push(e.expense.clone());
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::AddUser(cmd) => self.handle_add_user(cmd),
            LedgerCommand::RemoveUser(cmd) => self.handle_remove_user(cmd),
            LedgerCommand::AddExpense(cmd) => self.handle_add_expense(cmd),
        }
    }
}

impl Ledger {
    fn handle_add_user(&self, cmd: &AddUser) -> Result<Vec<LedgerEvent>, DomainError> {
        if self.has_user(cmd.user_id) {
            return Err(DomainError::validation("user id already exists"));
        }

        let user = User::new(cmd.user_id, &cmd.name, &cmd.email)?;

        Ok(vec![LedgerEvent::UserAdded(UserAdded {
            ledger_id: self.id,
            user,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_user(&self, cmd: &RemoveUser) -> Result<Vec<LedgerEvent>, DomainError> {
        if self.users.len() <= 1 {
            return Err(DomainError::validation("cannot remove the last remaining user"));
        }
        if !self.has_user(cmd.user_id) {
            return Err(DomainError::validation(format!("unknown user: {}", cmd.user_id)));
        }

        let removed_expenses = self
            .expenses
            .iter()
            .filter(|x| x.references(cmd.user_id))
            .map(|x| x.id)
            .collect();

        Ok(vec![LedgerEvent::UserRemoved(UserRemoved {
            ledger_id: self.id,
            user_id: cmd.user_id,
            removed_expenses,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_expense(&self, cmd: &AddExpense) -> Result<Vec<LedgerEvent>, DomainError> {
        if self.expense(cmd.expense_id).is_some() {
            return Err(DomainError::validation("expense id already exists"));
        }

        let description = cmd.description.trim();
        if description.is_empty() {
            return Err(DomainError::validation("description cannot be empty"));
        }

        if !cmd.amount.is_finite() || cmd.amount <= 0.0 {
            return Err(DomainError::validation("amount must be positive"));
        }

        if !self.has_user(cmd.paid_by) {
            return Err(DomainError::validation(format!("unknown payer: {}", cmd.paid_by)));
        }

        if cmd.participants.is_empty() {
            return Err(DomainError::validation("expense must have participants"));
        }

        let mut seen = HashSet::with_capacity(cmd.participants.len());
        for share in &cmd.participants {
            if !self.has_user(share.user_id) {
                return Err(DomainError::validation(format!(
                    "unknown participant: {}",
                    share.user_id
                )));
            }
            if !seen.insert(share.user_id) {
                return Err(DomainError::validation(format!(
                    "duplicate participant: {}",
                    share.user_id
                )));
            }
            if !share.amount.is_finite() || share.amount < 0.0 {
                return Err(DomainError::validation("share amount cannot be negative"));
            }
        }

        let assigned = share_total(&cmd.participants);
        if !within_tolerance(assigned, cmd.amount, self.tolerance) {
            return Err(DomainError::validation(format!(
                "shares add up to {assigned:.2} but the expense total is {:.2}",
                cmd.amount
            )));
        }

        let expense = Expense {
            id: cmd.expense_id,
            description: description.to_string(),
            amount: cmd.amount,
            paid_by: cmd.paid_by,
            split_mode: cmd.split_mode,
            participants: cmd.participants.clone(),
            category: cmd.category,
            date: cmd.date,
            created_at: cmd.occurred_at,
        };

        Ok(vec![LedgerEvent::ExpenseAdded(ExpenseAdded {
            ledger_id: self.id,
            expense,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitledger_events::execute;

    fn test_ledger_id() -> LedgerId {
        LedgerId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn add_user(ledger: &mut Ledger, name: &str) -> UserId {
        let user_id = UserId::new();
        let cmd = LedgerCommand::AddUser(AddUser {
            user_id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            occurred_at: test_time(),
        });
        execute(ledger, &cmd).unwrap();
        user_id
    }

    fn add_expense_cmd(paid_by: UserId, amount: f64, shares: &[(UserId, f64)]) -> LedgerCommand {
        LedgerCommand::AddExpense(AddExpense {
            expense_id: ExpenseId::new(),
            description: "Groceries".to_string(),
            amount,
            paid_by,
            split_mode: SplitMode::Custom,
            participants: shares
                .iter()
                .map(|&(id, a)| ParticipantShare::new(id, a))
                .collect(),
            category: Category::Shopping,
            date: test_date(),
            occurred_at: test_time(),
        })
    }

    fn expect_validation(result: Result<Vec<LedgerEvent>, DomainError>, needle: &str) {
        match result {
            Err(DomainError::Validation(msg)) if msg.contains(needle) => {}
            other => panic!("expected validation error containing {needle:?}, got {other:?}"),
        }
    }

    #[test]
    fn add_user_emits_user_added_and_applies() {
        let ledger_id = test_ledger_id();
        let mut ledger = Ledger::empty(ledger_id);
        let user_id = UserId::new();
        let cmd = LedgerCommand::AddUser(AddUser {
            user_id,
            name: " Mike Johnson ".to_string(),
            email: "mike@example.com".to_string(),
            occurred_at: test_time(),
        });

        let events = execute(&mut ledger, &cmd).unwrap();

        assert_eq!(events.len(), 1);
        match &events[0] {
            LedgerEvent::UserAdded(e) => {
                assert_eq!(e.ledger_id, ledger_id);
                assert_eq!(e.user.id, user_id);
                assert_eq!(e.user.name, "Mike Johnson");
            }
            other => panic!("expected UserAdded, got {other:?}"),
        }
        assert_eq!(ledger.users().len(), 1);
        assert_eq!(ledger.version(), 1);
    }

    #[test]
    fn duplicate_user_id_is_rejected() {
        let mut ledger = Ledger::empty(test_ledger_id());
        let user_id = add_user(&mut ledger, "Alex");
        let cmd = LedgerCommand::AddUser(AddUser {
            user_id,
            name: "Other".to_string(),
            email: "other@example.com".to_string(),
            occurred_at: test_time(),
        });

        expect_validation(ledger.handle(&cmd), "already exists");
    }

    #[test]
    fn last_user_cannot_be_removed() {
        let mut ledger = Ledger::empty(test_ledger_id());
        let only = add_user(&mut ledger, "Alex");
        let before = ledger.clone();

        let result = execute(
            &mut ledger,
            &LedgerCommand::RemoveUser(RemoveUser {
                user_id: only,
                occurred_at: test_time(),
            }),
        );

        expect_validation(result, "last remaining user");
        assert_eq!(ledger, before);
    }

    #[test]
    fn unknown_user_cannot_be_removed() {
        let mut ledger = Ledger::empty(test_ledger_id());
        add_user(&mut ledger, "Alex");
        add_user(&mut ledger, "Sarah");

        let result = ledger.handle(&LedgerCommand::RemoveUser(RemoveUser {
            user_id: UserId::new(),
            occurred_at: test_time(),
        }));

        expect_validation(result, "unknown user");
    }

    #[test]
    fn removal_cascades_to_referencing_expenses() {
        let mut ledger = Ledger::empty(test_ledger_id());
        let a = add_user(&mut ledger, "A");
        let b = add_user(&mut ledger, "B");
        let c = add_user(&mut ledger, "C");

        execute(&mut ledger, &add_expense_cmd(a, 20.0, &[(a, 10.0), (b, 10.0)])).unwrap();
        execute(&mut ledger, &add_expense_cmd(c, 30.0, &[(a, 15.0), (c, 15.0)])).unwrap();
        execute(&mut ledger, &add_expense_cmd(b, 8.0, &[(b, 4.0), (c, 4.0)])).unwrap();
        let kept = ledger.expenses()[1].id;
        let paid_by_b = ledger.expenses()[2].id;
        let shared_with_b = ledger.expenses()[0].id;

        let events = execute(
            &mut ledger,
            &LedgerCommand::RemoveUser(RemoveUser {
                user_id: b,
                occurred_at: test_time(),
            }),
        )
        .unwrap();

        match &events[0] {
            LedgerEvent::UserRemoved(e) => {
                assert_eq!(e.removed_expenses, vec![shared_with_b, paid_by_b]);
            }
            other => panic!("expected UserRemoved, got {other:?}"),
        }
        assert!(!ledger.has_user(b));
        assert_eq!(ledger.expenses().len(), 1);
        assert_eq!(ledger.expenses()[0].id, kept);
    }

    #[test]
    fn add_expense_validates_every_field() {
        let mut ledger = Ledger::empty(test_ledger_id());
        let a = add_user(&mut ledger, "A");
        let b = add_user(&mut ledger, "B");
        let stranger = UserId::new();

        expect_validation(ledger.handle(&add_expense_cmd(a, 0.0, &[(a, 0.0)])), "positive");
        expect_validation(ledger.handle(&add_expense_cmd(a, -5.0, &[(a, -5.0)])), "positive");
        expect_validation(ledger.handle(&add_expense_cmd(a, f64::NAN, &[(a, 1.0)])), "positive");
        expect_validation(ledger.handle(&add_expense_cmd(stranger, 10.0, &[(a, 10.0)])), "unknown payer");
        expect_validation(ledger.handle(&add_expense_cmd(a, 10.0, &[])), "participants");
        expect_validation(
            ledger.handle(&add_expense_cmd(a, 10.0, &[(a, 5.0), (stranger, 5.0)])),
            "unknown participant",
        );
        expect_validation(
            ledger.handle(&add_expense_cmd(a, 10.0, &[(b, 5.0), (b, 5.0)])),
            "duplicate participant",
        );
        expect_validation(
            ledger.handle(&add_expense_cmd(a, 10.0, &[(a, 15.0), (b, -5.0)])),
            "negative",
        );
        expect_validation(
            ledger.handle(&add_expense_cmd(a, 100.0, &[(a, 40.0), (b, 70.0)])),
            "add up to 110.00",
        );

        let mut blank = add_expense_cmd(a, 10.0, &[(a, 5.0), (b, 5.0)]);
        if let LedgerCommand::AddExpense(cmd) = &mut blank {
            cmd.description = "   ".to_string();
        }
        expect_validation(ledger.handle(&blank), "description");

        assert!(ledger.expenses().is_empty());
    }

    #[test]
    fn accepted_expense_keeps_shares_and_trims_description() {
        let mut ledger = Ledger::empty(test_ledger_id());
        let a = add_user(&mut ledger, "A");
        let b = add_user(&mut ledger, "B");
        let mut cmd = add_expense_cmd(a, 25.0, &[(a, 10.0), (b, 15.0)]);
        if let LedgerCommand::AddExpense(inner) = &mut cmd {
            inner.description = "  Taxi  ".to_string();
        }

        execute(&mut ledger, &cmd).unwrap();

        let expense = &ledger.expenses()[0];
        assert_eq!(expense.description, "Taxi");
        assert_eq!(expense.share_of(b), Some(15.0));
        assert_eq!(expense.split_mode, SplitMode::Custom);
        assert_eq!(ledger.expense(expense.id), Some(expense));
    }

    #[test]
    fn tolerance_is_configurable() {
        let mut ledger = Ledger::with_tolerance(test_ledger_id(), 0.5);
        let a = add_user(&mut ledger, "A");
        let b = add_user(&mut ledger, "B");

        assert!(ledger.handle(&add_expense_cmd(a, 10.0, &[(a, 5.0), (b, 5.25)])).is_ok());
        assert!(ledger.handle(&add_expense_cmd(a, 10.0, &[(a, 5.0), (b, 6.0)])).is_err());
    }

    #[test]
    fn replaying_history_reproduces_state() {
        let id = test_ledger_id();
        let mut ledger = Ledger::empty(id);
        let mut history = Vec::new();
        for name in ["A", "B"] {
            let cmd = LedgerCommand::AddUser(AddUser {
                user_id: UserId::new(),
                name: name.to_string(),
                email: format!("{name}@example.com"),
                occurred_at: test_time(),
            });
            history.extend(execute(&mut ledger, &cmd).unwrap());
        }
        let (a, b) = (ledger.users()[0].id, ledger.users()[1].id);
        history.extend(execute(&mut ledger, &add_expense_cmd(a, 8.0, &[(a, 4.0), (b, 4.0)])).unwrap());

        let mut replica = Ledger::empty(id);
        replica.replay(&history);

        assert_eq!(replica.version(), 3);
        assert_eq!(replica.users(), ledger.users());
        assert_eq!(replica.expenses(), ledger.expenses());
    }
}
