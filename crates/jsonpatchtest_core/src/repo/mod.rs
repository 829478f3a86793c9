//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define record-oriented data access contracts.
//! - Own id generation, referential checks and deletion policy.
//!
//! # Invariants
//! - Repositories only accept connections migrated to `latest_version()`.
//! - Write paths never persist a `headerId` that does not resolve.

use crate::db::migrations::{current_user_version, latest_version};
use crate::repo::header_repo::{RepoError, RepoResult};
use rusqlite::Connection;

pub mod detail_repo;
pub mod header_repo;

/// Rejects connections that are not migrated or miss required schema parts.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    for &column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub(crate) fn header_exists(conn: &Connection, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM header WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Appends `LIMIT`/`OFFSET` clauses using SQLite's `LIMIT -1` idiom for
/// offset-only pages.
pub(crate) fn push_pagination(
    sql: &mut String,
    bind_values: &mut Vec<rusqlite::types::Value>,
    limit: Option<u32>,
    offset: u32,
) {
    use rusqlite::types::Value;

    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(offset)));
        }
    } else if offset > 0 {
        sql.push_str(" LIMIT -1 OFFSET ?");
        bind_values.push(Value::Integer(i64::from(offset)));
    }
}
