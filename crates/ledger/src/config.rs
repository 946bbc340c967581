//! Ledger configuration (environment driven).
//!
//! - `SPLITLEDGER_SPLIT_TOLERANCE`: absolute tolerance for share sums (default 0.01)
//! - `SPLITLEDGER_MEMBERS`: initial roster, `Name <email>` entries separated by `;`
//!
//! Invalid values are logged and replaced by defaults.

use serde::{Deserialize, Serialize};

use splitledger_core::{DomainError, DomainResult};

use crate::split::SPLIT_TOLERANCE;

pub const TOLERANCE_ENV: &str = "SPLITLEDGER_SPLIT_TOLERANCE";
pub const MEMBERS_ENV: &str = "SPLITLEDGER_MEMBERS";

/// A member to register when the store is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSeed {
    pub name: String,
    pub email: String,
}

impl MemberSeed {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub split_tolerance: f64,
    pub members: Vec<MemberSeed>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            split_tolerance: SPLIT_TOLERANCE,
            members: Vec::new(),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(TOLERANCE_ENV) {
            match raw.trim().parse::<f64>() {
                Ok(t) if t.is_finite() && t >= 0.0 => config.split_tolerance = t,
                _ => tracing::warn!(
                    value = %raw,
                    "{TOLERANCE_ENV} is not a non-negative number; using {SPLIT_TOLERANCE}"
                ),
            }
        }

        if let Some(raw) = lookup(MEMBERS_ENV) {
            match parse_members(&raw) {
                Ok(members) => config.members = members,
                Err(err) => tracing::warn!("ignoring {MEMBERS_ENV}: {err}"),
            }
        }

        config
    }
}

/// Parse `Name <email>; Name <email>` into member seeds. Blank entries are skipped.
pub fn parse_members(raw: &str) -> DomainResult<Vec<MemberSeed>> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_member)
        .collect()
}

fn parse_member(entry: &str) -> DomainResult<MemberSeed> {
    let malformed = || DomainError::validation(format!("expected `Name <email>`, got `{entry}`"));

    let (name, rest) = entry.split_once('<').ok_or_else(malformed)?;
    let email = rest.strip_suffix('>').ok_or_else(malformed)?;

    let (name, email) = (name.trim(), email.trim());
    if name.is_empty() || email.is_empty() {
        return Err(malformed());
    }

    Ok(MemberSeed::new(name, email))
}
