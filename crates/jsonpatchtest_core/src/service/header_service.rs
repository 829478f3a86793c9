//! Header/detail use-case service.
//!
//! # Responsibility
//! - Provide stable entry points for building and editing header/detail sets.
//! - Delegate persistence and referential checks to repositories.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::detail::{Detail, DetailId};
use crate::model::header::{Header, HeaderId};
use crate::repo::detail_repo::{DetailListQuery, DetailRepository};
use crate::repo::header_repo::{HeaderDeletePolicy, HeaderRepository, RepoError, RepoResult};

/// Use-case service over one header and one detail repository.
pub struct HeaderService<H: HeaderRepository, D: DetailRepository> {
    headers: H,
    details: D,
}

impl<H: HeaderRepository, D: DetailRepository> HeaderService<H, D> {
    pub fn new(headers: H, details: D) -> Self {
        Self { headers, details }
    }

    pub fn headers(&self) -> &H {
        &self.headers
    }

    pub fn details(&self) -> &D {
        &self.details
    }

    /// Creates and persists a header, returning it with its generated id.
    pub fn create_header(&self, name: Option<String>) -> RepoResult<Header> {
        let mut header = Header::new(name);
        self.headers.create_header(&mut header)?;
        Ok(header)
    }

    /// Creates a detail owned by `header_id`.
    ///
    /// # Errors
    /// - `DanglingHeader` when `header_id` does not exist.
    pub fn add_detail(&self, header_id: HeaderId, name: Option<String>) -> RepoResult<Detail> {
        let mut detail = Detail::new(name);
        detail.set_header_id(Some(header_id))?;
        self.details.create_detail(&mut detail)?;
        Ok(detail)
    }

    /// Creates a detail with no owning header.
    pub fn add_unattached_detail(&self, name: Option<String>) -> RepoResult<Detail> {
        let mut detail = Detail::new(name);
        self.details.create_detail(&mut detail)?;
        Ok(detail)
    }

    /// Moves an existing detail under `header_id`.
    pub fn attach_detail(&self, detail_id: DetailId, header_id: HeaderId) -> RepoResult<Detail> {
        let mut detail = self.load_detail(detail_id)?;
        detail.set_header_id(Some(header_id))?;
        self.details.update_detail(&detail)?;
        Ok(detail)
    }

    /// Clears the owning header of an existing detail.
    pub fn detach_detail(&self, detail_id: DetailId) -> RepoResult<Detail> {
        let mut detail = self.load_detail(detail_id)?;
        detail.clear_header();
        self.details.update_detail(&detail)?;
        Ok(detail)
    }

    pub fn rename_header(&self, id: HeaderId, name: Option<String>) -> RepoResult<Header> {
        let mut header = self
            .headers
            .get_header(id)?
            .ok_or(RepoError::HeaderNotFound(id))?;
        header.set_name(name);
        self.headers.update_header(&header)?;
        Ok(header)
    }

    pub fn rename_detail(&self, id: DetailId, name: Option<String>) -> RepoResult<Detail> {
        let mut detail = self.load_detail(id)?;
        detail.set_name(name);
        self.details.update_detail(&detail)?;
        Ok(detail)
    }

    /// Lists all details owned by an existing header.
    ///
    /// Returns `HeaderNotFound` rather than an empty list for unknown ids.
    pub fn details_of(&self, header_id: HeaderId) -> RepoResult<Vec<Detail>> {
        if self.headers.get_header(header_id)?.is_none() {
            return Err(RepoError::HeaderNotFound(header_id));
        }
        self.details
            .list_details(&DetailListQuery::for_header(header_id))
    }

    /// Resolves the owning header of a detail.
    pub fn header_of(&self, detail_id: DetailId) -> RepoResult<Option<Header>> {
        let detail = self.load_detail(detail_id)?;
        self.details.find_header(&detail)
    }

    pub fn delete_header(&self, id: HeaderId, policy: HeaderDeletePolicy) -> RepoResult<()> {
        self.headers.delete_header(id, policy)
    }

    pub fn delete_detail(&self, id: DetailId) -> RepoResult<()> {
        self.details.delete_detail(id)
    }

    fn load_detail(&self, id: DetailId) -> RepoResult<Detail> {
        self.details
            .get_detail(id)?
            .ok_or(RepoError::DetailNotFound(id))
    }
}
