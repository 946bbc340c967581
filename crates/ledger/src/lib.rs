//! Group expense ledger: members, shared expenses, splits and derived balances.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod balance;
pub mod config;
pub mod expense;
pub mod ledger;
pub mod projection;
pub mod split;
pub mod store;
pub mod user;

pub use balance::{Balance, SETTLED_THRESHOLD, compute_balances};
pub use config::{LedgerConfig, MemberSeed};
pub use expense::{Category, Expense, ParticipantShare, SplitMode};
pub use ledger::{
    AddExpense, AddUser, ExpenseAdded, Ledger, LedgerCommand, LedgerEvent, LedgerId, RemoveUser,
    UserAdded, UserRemoved,
};
pub use projection::BalancesProjection;
pub use split::{
    CustomSplit, SPLIT_TOLERANCE, Split, custom_split, equal_split, within_tolerance,
};
pub use store::{LedgerEnvelope, LedgerStore, LedgerSummary, NewExpense};
pub use user::User;
