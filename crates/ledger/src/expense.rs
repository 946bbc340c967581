use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use splitledger_core::{DomainError, Entity, ExpenseId, UserId};

/// How an expense total is divided among its participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    Equal,
    Custom,
}

/// What one participant owes for one expense.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticipantShare {
    pub user_id: UserId,
    /// Owed amount, never negative.
    pub amount: f64,
}

impl ParticipantShare {
    pub fn new(user_id: UserId, amount: f64) -> Self {
        Self { user_id, amount }
    }
}

/// Expense category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Food & Dining")]
    FoodAndDining,
    #[serde(rename = "Transportation")]
    Transportation,
    #[serde(rename = "Shopping")]
    Shopping,
    #[serde(rename = "Entertainment")]
    Entertainment,
    #[serde(rename = "Bills & Utilities")]
    BillsAndUtilities,
    #[serde(rename = "Travel")]
    Travel,
    #[serde(rename = "Healthcare")]
    Healthcare,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::FoodAndDining,
        Category::Transportation,
        Category::Shopping,
        Category::Entertainment,
        Category::BillsAndUtilities,
        Category::Travel,
        Category::Healthcare,
        Category::Other,
    ];

    /// Display label, also the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            Category::FoodAndDining => "Food & Dining",
            Category::Transportation => "Transportation",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::BillsAndUtilities => "Bills & Utilities",
            Category::Travel => "Travel",
            Category::Healthcare => "Healthcare",
            Category::Other => "Other",
        }
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

impl core::str::FromStr for Category {
    type Err = DomainError;

    /// Case-insensitive match on the display label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.is_empty() {
            return Err(DomainError::validation("category is required"));
        }
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::validation(format!("unknown category: {wanted}")))
    }
}

/// A recorded, immutable expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub amount: f64,
    pub paid_by: UserId,
    pub split_mode: SplitMode,
    pub participants: Vec<ParticipantShare>,
    pub category: Category,
    /// Business date of the expense.
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Whether `user_id` paid for or takes part in this expense.
    pub fn references(&self, user_id: UserId) -> bool {
        self.paid_by == user_id || self.participants.iter().any(|p| p.user_id == user_id)
    }

    pub fn share_of(&self, user_id: UserId) -> Option<f64> {
        self.participants
            .iter()
            .find(|p| p.user_id == user_id)
            .map(|p| p.amount)
    }
}

impl Entity for Expense {
    type Id = ExpenseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
