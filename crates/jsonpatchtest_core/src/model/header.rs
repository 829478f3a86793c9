//! Header record.
//!
//! # Responsibility
//! - Root record of the header/detail relationship.
//! - Hold the surrogate id assigned by storage and a free-form name.
//!
//! # Invariants
//! - `id` is `None` until the record is first persisted.
//! - `id` is never reassigned once set.

use super::{check_id, ModelError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Surrogate identifier of a header row.
pub type HeaderId = i64;

/// Root record identified by a storage-generated id.
///
/// Equality is structural: two headers are equal when both `id` and `name`
/// match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawHeader")]
pub struct Header {
    id: Option<HeaderId>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct RawHeader {
    id: Option<HeaderId>,
    name: Option<String>,
}

impl TryFrom<RawHeader> for Header {
    type Error = ModelError;

    fn try_from(raw: RawHeader) -> Result<Self, Self::Error> {
        match raw.id {
            Some(id) => Self::with_id(id, raw.name),
            None => Ok(Self::new(raw.name)),
        }
    }
}

impl Header {
    /// Creates a transient header.
    pub fn new(name: Option<String>) -> Self {
        Self { id: None, name }
    }

    /// Creates a transient header with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(Some(name.into()))
    }

    /// Rebuilds an already persisted header.
    ///
    /// Used by repository read paths and by callers holding a known row id.
    pub fn with_id(id: HeaderId, name: Option<String>) -> Result<Self, ModelError> {
        let id = check_id("header", id)?;
        Ok(Self { id: Some(id), name })
    }

    pub fn id(&self) -> Option<HeaderId> {
        self.id
    }

    /// Returns whether storage has assigned an id to this header.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Records the id generated by storage on first insert.
    ///
    /// # Errors
    /// - `IdAlreadyAssigned` when this header already carries an id.
    /// - `InvalidId` when `id` is not positive.
    pub fn assign_id(&mut self, id: HeaderId) -> Result<(), ModelError> {
        if let Some(current) = self.id {
            return Err(ModelError::IdAlreadyAssigned {
                entity: "header",
                id: current,
            });
        }
        self.id = Some(check_id("header", id)?);
        Ok(())
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Header{{id=")?;
        match self.id {
            Some(id) => write!(f, "{id}")?,
            None => write!(f, "null")?,
        }
        write!(f, ", name={}}}", self.name.as_deref().unwrap_or("null"))
    }
}
