//! Header repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `header` table.
//! - Apply the explicit header deletion policy to referencing details.
//!
//! # Invariants
//! - Ids are generated by SQLite on insert and written back into the record.
//! - Deleting a header never leaves a detail pointing at a missing row.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::detail::DetailId;
use crate::model::header::{Header, HeaderId};
use crate::model::ModelError;
use crate::repo::{ensure_connection_ready, header_exists, push_pagination};
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use thiserror::Error;

pub(crate) const HEADER_SELECT_SQL: &str = "SELECT id, name FROM header";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for header/detail persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("header not found: {0}")]
    HeaderNotFound(HeaderId),
    #[error("detail not found: {0}")]
    DetailNotFound(DetailId),
    /// A detail references a header row that does not exist.
    #[error("header {0} referenced by detail does not exist")]
    DanglingHeader(HeaderId),
    /// Restrict policy refused to delete a referenced header.
    #[error("header {id} is still referenced by {detail_count} detail(s)")]
    HeaderInUse { id: HeaderId, detail_count: u64 },
    #[error("{entity} is already persisted with id {id}")]
    AlreadyPersisted { entity: &'static str, id: i64 },
    #[error("{0} has not been persisted yet")]
    Transient(&'static str),
    #[error("repository requires schema version {expected_version}, got {actual_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("repository requires table `{0}`")]
    MissingRequiredTable(&'static str),
    #[error("repository requires column `{column}` in table `{table}`")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// What happens to referencing details when a header is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderDeletePolicy {
    /// Refuse to delete while any detail references the header.
    #[default]
    Restrict,
    /// Clear `headerId` on referencing details, keeping them unattached.
    Detach,
    /// Delete referencing details together with the header.
    Cascade,
}

impl HeaderDeletePolicy {
    fn as_str(self) -> &'static str {
        match self {
            Self::Restrict => "restrict",
            Self::Detach => "detach",
            Self::Cascade => "cascade",
        }
    }
}

/// Query options for listing headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderListQuery {
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for header CRUD operations.
pub trait HeaderRepository {
    /// Inserts a transient header and assigns the generated id to it.
    fn create_header(&self, header: &mut Header) -> RepoResult<HeaderId>;
    /// Writes mutable fields of a persisted header.
    fn update_header(&self, header: &Header) -> RepoResult<()>;
    fn get_header(&self, id: HeaderId) -> RepoResult<Option<Header>>;
    fn list_headers(&self, query: &HeaderListQuery) -> RepoResult<Vec<Header>>;
    /// Counts details whose `headerId` points at `id`.
    fn count_details(&self, id: HeaderId) -> RepoResult<u64>;
    /// Deletes one header, handling referencing details per `policy`.
    fn delete_header(&self, id: HeaderId, policy: HeaderDeletePolicy) -> RepoResult<()>;
}

/// SQLite-backed header repository.
pub struct SqliteHeaderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHeaderRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// Deletion policies touch `detail`, so both tables are checked.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "header", &["id", "name"])?;
        ensure_connection_ready(conn, "detail", &["id", "headerId"])?;
        Ok(Self { conn })
    }
}

impl HeaderRepository for SqliteHeaderRepository<'_> {
    fn create_header(&self, header: &mut Header) -> RepoResult<HeaderId> {
        if let Some(id) = header.id() {
            return Err(RepoError::AlreadyPersisted {
                entity: "header",
                id,
            });
        }

        self.conn
            .execute("INSERT INTO header (name) VALUES (?1);", [header.name()])?;
        let id = self.conn.last_insert_rowid();
        header.assign_id(id)?;

        info!("event=header_create module=repo status=ok header_id={id}");
        Ok(id)
    }

    fn update_header(&self, header: &Header) -> RepoResult<()> {
        let id = header.id().ok_or(RepoError::Transient("header"))?;

        let changed = self.conn.execute(
            "UPDATE header SET name = ?2 WHERE id = ?1;",
            params![id, header.name()],
        )?;

        if changed == 0 {
            return Err(RepoError::HeaderNotFound(id));
        }

        Ok(())
    }

    fn get_header(&self, id: HeaderId) -> RepoResult<Option<Header>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{HEADER_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_header_row(row)?));
        }

        Ok(None)
    }

    fn list_headers(&self, query: &HeaderListQuery) -> RepoResult<Vec<Header>> {
        let mut sql = format!("{HEADER_SELECT_SQL} ORDER BY id ASC");
        let mut bind_values: Vec<Value> = Vec::new();
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut headers = Vec::new();

        while let Some(row) = rows.next()? {
            headers.push(parse_header_row(row)?);
        }

        Ok(headers)
    }

    fn count_details(&self, id: HeaderId) -> RepoResult<u64> {
        count_referencing_details(self.conn, id)
    }

    fn delete_header(&self, id: HeaderId, policy: HeaderDeletePolicy) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        if !header_exists(&tx, id)? {
            return Err(RepoError::HeaderNotFound(id));
        }

        let detail_count = count_referencing_details(&tx, id)?;
        if detail_count > 0 {
            match policy {
                HeaderDeletePolicy::Restrict => {
                    warn!(
                        "event=header_delete module=repo status=rejected policy=restrict header_id={id} detail_count={detail_count}"
                    );
                    return Err(RepoError::HeaderInUse { id, detail_count });
                }
                HeaderDeletePolicy::Detach => {
                    tx.execute("UPDATE detail SET headerId = NULL WHERE headerId = ?1;", [id])?;
                }
                HeaderDeletePolicy::Cascade => {
                    tx.execute("DELETE FROM detail WHERE headerId = ?1;", [id])?;
                }
            }
        }

        tx.execute("DELETE FROM header WHERE id = ?1;", [id])?;
        tx.commit()?;

        info!(
            "event=header_delete module=repo status=ok policy={} header_id={id} detail_count={detail_count}",
            policy.as_str()
        );
        Ok(())
    }
}

pub(crate) fn parse_header_row(row: &Row<'_>) -> RepoResult<Header> {
    let id: i64 = row.get("id")?;
    Header::with_id(id, row.get("name")?)
        .map_err(|err| RepoError::InvalidData(format!("{err} in header.id")))
}

fn count_referencing_details(conn: &Connection, id: HeaderId) -> RepoResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM detail WHERE headerId = ?1;",
        [id],
        |row| row.get(0),
    )?;
    u64::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative detail count `{count}`")))
}
