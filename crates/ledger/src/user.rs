use serde::{Deserialize, Serialize};

use splitledger_core::{DomainError, DomainResult, Entity, UserId};

/// A group member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl User {
    /// Build a user from raw input. Name and email are stored trimmed and must not be empty.
    pub fn new(id: UserId, name: &str, email: &str) -> DomainResult<Self> {
        let name = name.trim();
        let email = email.trim();

        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if email.is_empty() {
            return Err(DomainError::validation("email cannot be empty"));
        }

        Ok(Self {
            id,
            name: name.to_string(),
            email: email.to_string(),
        })
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
