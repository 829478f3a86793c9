//! Persistence-mapped records for the header/detail relationship.
//!
//! # Responsibility
//! - Define the `Header` and `Detail` value shapes shared by storage and callers.
//! - Keep identity rules (transient vs persisted) inside the records.
//!
//! # Invariants
//! - Surrogate ids are absent until the storage layer assigns them.
//! - Once assigned, an id is never replaced.
//! - `Detail` refers to its header by id only; records never embed each other.

use thiserror::Error;

pub mod detail;
pub mod header;

/// Errors raised by record-level identity rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Surrogate ids are generated by SQLite and are always positive.
    #[error("invalid {entity} id `{id}`: ids must be positive")]
    InvalidId { entity: &'static str, id: i64 },
    /// Id is immutable after first persistence.
    #[error("{entity} already has id `{id}`")]
    IdAlreadyAssigned { entity: &'static str, id: i64 },
    /// A header without an id cannot be used as a foreign-key target.
    #[error("cannot reference a header that has not been persisted")]
    TransientHeader,
}

pub(crate) fn check_id(entity: &'static str, id: i64) -> Result<i64, ModelError> {
    if id <= 0 {
        return Err(ModelError::InvalidId { entity, id });
    }
    Ok(id)
}
