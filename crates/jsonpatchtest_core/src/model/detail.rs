//! Detail record.
//!
//! # Responsibility
//! - Child record of the header/detail relationship.
//! - Carry the owning header as an explicit foreign key (`headerId`).
//!
//! # Invariants
//! - `id` follows the same transient/persisted rules as `Header::id`.
//! - The header association is stored as an id, never as an embedded value.
//! - Assignment does not check that the header exists; storage does that on
//!   write.

use super::header::{Header, HeaderId};
use super::{check_id, ModelError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Surrogate identifier of a detail row.
pub type DetailId = i64;

/// Child record that optionally belongs to one header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDetail")]
pub struct Detail {
    id: Option<DetailId>,
    name: Option<String>,
    /// Serialized as `headerId` to match the join column name.
    #[serde(rename = "headerId")]
    header_id: Option<HeaderId>,
}

#[derive(Deserialize)]
struct RawDetail {
    id: Option<DetailId>,
    name: Option<String>,
    #[serde(rename = "headerId")]
    header_id: Option<HeaderId>,
}

impl TryFrom<RawDetail> for Detail {
    type Error = ModelError;

    fn try_from(raw: RawDetail) -> Result<Self, Self::Error> {
        match raw.id {
            Some(id) => Self::with_id(id, raw.name, raw.header_id),
            None => {
                let mut detail = Self::new(raw.name);
                detail.set_header_id(raw.header_id)?;
                Ok(detail)
            }
        }
    }
}

impl Detail {
    /// Creates a transient, unattached detail.
    pub fn new(name: Option<String>) -> Self {
        Self {
            id: None,
            name,
            header_id: None,
        }
    }

    /// Creates a transient, unattached detail with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(Some(name.into()))
    }

    /// Rebuilds an already persisted detail.
    ///
    /// # Errors
    /// - `InvalidId` when `id` or `header_id` is not positive.
    pub fn with_id(
        id: DetailId,
        name: Option<String>,
        header_id: Option<HeaderId>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            id: Some(check_id("detail", id)?),
            name,
            header_id: check_header_id(header_id)?,
        })
    }

    pub fn id(&self) -> Option<DetailId> {
        self.id
    }

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
    /// - `IdAlreadyAssigned` when this detail already carries an id.
    /// - `InvalidId` when `id` is not positive.
    pub fn assign_id(&mut self, id: DetailId) -> Result<(), ModelError> {
        if let Some(current) = self.id {
            return Err(ModelError::IdAlreadyAssigned {
                entity: "detail",
                id: current,
            });
        }
        self.id = Some(check_id("detail", id)?);
        Ok(())
    }

    /// Returns the owning header id, or `None` for an unattached detail.
    pub fn header_id(&self) -> Option<HeaderId> {
        self.header_id
    }

    /// Sets the raw foreign key.
    ///
    /// # Errors
    /// - `InvalidId` when `header_id` is not positive; the old value is kept.
    pub fn set_header_id(&mut self, header_id: Option<HeaderId>) -> Result<(), ModelError> {
        self.header_id = check_header_id(header_id)?;
        Ok(())
    }

    /// Attaches this detail to `header`.
    ///
    /// # Errors
    /// - `TransientHeader` when `header` has no id yet.
    pub fn set_header(&mut self, header: &Header) -> Result<(), ModelError> {
        let header_id = header.id().ok_or(ModelError::TransientHeader)?;
        self.header_id = Some(header_id);
        Ok(())
    }

    pub fn clear_header(&mut self) {
        self.header_id = None;
    }

    pub fn is_attached(&self) -> bool {
        self.header_id.is_some()
    }

    /// Returns whether this detail references `header`.
    ///
    /// Transient headers own no details.
    pub fn belongs_to(&self, header: &Header) -> bool {
        match (self.header_id, header.id()) {
            (Some(owner), Some(id)) => owner == id,
            _ => false,
        }
    }
}

fn check_header_id(header_id: Option<HeaderId>) -> Result<Option<HeaderId>, ModelError> {
    header_id.map(|id| check_id("header", id)).transpose()
}

impl Display for Detail {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = self.id.map_or_else(|| "null".to_string(), |id| id.to_string());
        let header_id = self
            .header_id
            .map_or_else(|| "null".to_string(), |id| id.to_string());
        write!(
            f,
            "Detail{{id={id}, name={}, headerId={header_id}}}",
            self.name.as_deref().unwrap_or("null")
        )
    }
}
