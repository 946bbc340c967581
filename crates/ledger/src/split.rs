//! Split calculator: turns an expense total and a participant selection into owed shares.
//!
//! Pure functions only. Rejecting a bad split is the ledger's job; the calculator
//! computes and reports.

use serde::{Deserialize, Serialize};

use splitledger_core::UserId;

use crate::expense::{ParticipantShare, SplitMode};

/// Absolute tolerance when comparing a share sum against an expense total.
pub const SPLIT_TOLERANCE: f64 = 0.01;

/// Slack for representation error: a one-cent gap can come out as 0.010000000000000009.
const COMPARISON_EPSILON: f64 = 1e-9;

/// Participant selection as entered by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "participants", rename_all = "lowercase")]
pub enum Split {
    /// Divide the total evenly across these users.
    Equal(Vec<UserId>),
    /// Explicit per-user amounts.
    Custom(Vec<ParticipantShare>),
}

impl Split {
    pub fn mode(&self) -> SplitMode {
        match self {
            Split::Equal(_) => SplitMode::Equal,
            Split::Custom(_) => SplitMode::Custom,
        }
    }
}

/// Result of checking explicit amounts against the total.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomSplit {
    pub shares: Vec<ParticipantShare>,
    /// Sum of all share amounts.
    pub assigned: f64,
    /// `assigned - total`; positive means over-assigned.
    pub difference: f64,
    /// `|difference|` exceeds the tolerance.
    pub mismatch: bool,
}

/// Equal split with remainder correction.
///
/// Per-head share truncated to cents; the last participant takes the remainder.
/// No participants yields no shares.
pub fn equal_split(total: f64, participants: &[UserId]) -> Vec<ParticipantShare> {
    let Some((last, rest)) = participants.split_last() else {
        return Vec::new();
    };

    let per_head = truncate_to_cents(total / participants.len() as f64);
    let mut shares: Vec<ParticipantShare> = rest
        .iter()
        .map(|&user_id| ParticipantShare::new(user_id, per_head))
        .collect();

    let remainder = total - per_head * rest.len() as f64;
    shares.push(ParticipantShare::new(*last, remainder));
    shares
}

/// Sum explicit amounts and flag (never correct) a mismatch with `total`.
pub fn custom_split(total: f64, shares: Vec<ParticipantShare>, tolerance: f64) -> CustomSplit {
    let assigned = share_total(&shares);
    let difference = assigned - total;
    CustomSplit {
        shares,
        assigned,
        difference,
        mismatch: !within_tolerance(assigned, total, tolerance),
    }
}

/// Whether `assigned` matches `total` to within `tolerance`, inclusive.
pub fn within_tolerance(assigned: f64, total: f64, tolerance: f64) -> bool {
    (assigned - total).abs() <= tolerance + COMPARISON_EPSILON
}

pub fn share_total(shares: &[ParticipantShare]) -> f64 {
    shares.iter().map(|s| s.amount).sum()
}

/// Round half away from zero to two decimals.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn truncate_to_cents(value: f64) -> f64 {
    // The epsilon absorbs representation error such as 0.29 * 100 = 28.999...
    ((value * 100.0) + 1e-9).floor() / 100.0
}
