//! Header/detail persistence core.
//! Records, SQLite storage bootstrap and repositories for a one-to-many
//! header/detail relationship.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::detail::{Detail, DetailId};
pub use model::header::{Header, HeaderId};
pub use model::ModelError;
pub use repo::detail_repo::{
    DetailHeaderFilter, DetailListQuery, DetailRepository, SqliteDetailRepository,
};
pub use repo::header_repo::{
    HeaderDeletePolicy, HeaderListQuery, HeaderRepository, RepoError, RepoResult,
    SqliteHeaderRepository,
};
pub use service::header_service::HeaderService;

/// Minimal health-check API for linkage checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
