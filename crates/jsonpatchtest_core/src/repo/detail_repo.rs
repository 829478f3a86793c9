//! Detail repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `detail` table.
//! - Resolve the `headerId` foreign key into a `Header` on demand.
//!
//! # Invariants
//! - A non-null `headerId` is checked against `header` in the same immediate
//!   transaction as the write that stores it.
//! - Child listing is deterministic: `id ASC`.

use crate::model::detail::{Detail, DetailId};
use crate::model::header::{Header, HeaderId};
use crate::repo::header_repo::{parse_header_row, RepoError, RepoResult, HEADER_SELECT_SQL};
use crate::repo::{ensure_connection_ready, header_exists, push_pagination};
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const DETAIL_SELECT_SQL: &str = "SELECT id, name, headerId FROM detail";

/// Header association filter for detail listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetailHeaderFilter {
    /// Attached and unattached details.
    #[default]
    Any,
    /// Only details with `headerId IS NULL`.
    Unattached,
    /// Only details owned by one header.
    Header(HeaderId),
}

/// Query options for listing details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailListQuery {
    pub header: DetailHeaderFilter,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl DetailListQuery {
    /// All details owned by `header_id`, unpaginated.
    pub fn for_header(header_id: HeaderId) -> Self {
        Self {
            header: DetailHeaderFilter::Header(header_id),
            ..Self::default()
        }
    }
}

/// Repository interface for detail CRUD operations.
pub trait DetailRepository {
    /// Inserts a transient detail and assigns the generated id to it.
    fn create_detail(&self, detail: &mut Detail) -> RepoResult<DetailId>;
    fn update_detail(&self, detail: &Detail) -> RepoResult<()>;
    fn get_detail(&self, id: DetailId) -> RepoResult<Option<Detail>>;
    fn list_details(&self, query: &DetailListQuery) -> RepoResult<Vec<Detail>>;
    fn delete_detail(&self, id: DetailId) -> RepoResult<()>;
    /// Loads the header referenced by `detail`.
    ///
    /// Returns `Ok(None)` for unattached details.
    fn find_header(&self, detail: &Detail) -> RepoResult<Option<Header>>;
}

/// SQLite-backed detail repository.
pub struct SqliteDetailRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDetailRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "header", &["id", "name"])?;
        ensure_connection_ready(conn, "detail", &["id", "name", "headerId"])?;
        Ok(Self { conn })
    }
}

impl DetailRepository for SqliteDetailRepository<'_> {
    fn create_detail(&self, detail: &mut Detail) -> RepoResult<DetailId> {
        if let Some(id) = detail.id() {
            return Err(RepoError::AlreadyPersisted {
                entity: "detail",
                id,
            });
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_header_resolves(&tx, detail)?;
        tx.execute(
            "INSERT INTO detail (name, headerId) VALUES (?1, ?2);",
            params![detail.name(), detail.header_id()],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        detail.assign_id(id)?;

        info!(
            "event=detail_create module=repo status=ok detail_id={id} attached={}",
            detail.is_attached()
        );
        Ok(id)
    }

    fn update_detail(&self, detail: &Detail) -> RepoResult<()> {
        let id = detail.id().ok_or(RepoError::Transient("detail"))?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_header_resolves(&tx, detail)?;
        let changed = tx.execute(
            "UPDATE detail SET name = ?2, headerId = ?3 WHERE id = ?1;",
            params![id, detail.name(), detail.header_id()],
        )?;

        if changed == 0 {
            return Err(RepoError::DetailNotFound(id));
        }

        tx.commit()?;
        Ok(())
    }

    fn get_detail(&self, id: DetailId) -> RepoResult<Option<Detail>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DETAIL_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_detail_row(row)?));
        }

        Ok(None)
    }

    fn list_details(&self, query: &DetailListQuery) -> RepoResult<Vec<Detail>> {
        let mut sql = format!("{DETAIL_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        match query.header {
            DetailHeaderFilter::Any => {}
            DetailHeaderFilter::Unattached => sql.push_str(" AND headerId IS NULL"),
            DetailHeaderFilter::Header(header_id) => {
                sql.push_str(" AND headerId = ?");
                bind_values.push(Value::Integer(header_id));
            }
        }

        sql.push_str(" ORDER BY id ASC");
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut details = Vec::new();

        while let Some(row) = rows.next()? {
            details.push(parse_detail_row(row)?);
        }

        Ok(details)
    }

    fn delete_detail(&self, id: DetailId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM detail WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::DetailNotFound(id));
        }

        Ok(())
    }

    fn find_header(&self, detail: &Detail) -> RepoResult<Option<Header>> {
        let Some(header_id) = detail.header_id() else {
            return Ok(None);
        };

        let mut stmt = self
            .conn
            .prepare(&format!("{HEADER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([header_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_header_row(row)?)),
            None => Err(RepoError::DanglingHeader(header_id)),
        }
    }
}

fn ensure_header_resolves(conn: &Connection, detail: &Detail) -> RepoResult<()> {
    if let Some(header_id) = detail.header_id() {
        if !header_exists(conn, header_id)? {
            warn!(
                "event=detail_write module=repo status=rejected error_code=dangling_header header_id={header_id}"
            );
            return Err(RepoError::DanglingHeader(header_id));
        }
    }
    Ok(())
}

fn parse_detail_row(row: &Row<'_>) -> RepoResult<Detail> {
    let id: i64 = row.get("id")?;
    Detail::with_id(id, row.get("name")?, row.get("headerId")?)
        .map_err(|err| RepoError::InvalidData(format!("{err} in detail row {id}")))
}
