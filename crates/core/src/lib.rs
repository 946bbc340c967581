//! `splitledger-core`: ids, entity and aggregate traits, domain errors.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::{Entity, find_entity, position_of};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, ExpenseId, UserId};
