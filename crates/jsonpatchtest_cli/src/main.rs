//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `jsonpatchtest_core` linkage without any external setup.
//! - Run the canonical header/detail example against an in-memory database.
//! - Write core logs to `$JSONPATCHTEST_LOG_DIR` when it is set.

use jsonpatchtest_core::db::open_db_in_memory;
use jsonpatchtest_core::{
    Detail, DetailRepository, Header, HeaderRepository, SqliteDetailRepository,
    SqliteHeaderRepository,
};
use std::error::Error;
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "JSONPATCHTEST_LOG_DIR";
const LOG_LEVEL_ENV: &str = "JSONPATCHTEST_LOG_LEVEL";

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        let level = std::env::var(LOG_LEVEL_ENV)
            .unwrap_or_else(|_| jsonpatchtest_core::default_log_level().to_string());
        if let Err(err) = jsonpatchtest_core::init_logging(&level, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    println!("jsonpatchtest_core ping={}", jsonpatchtest_core::ping());
    println!(
        "jsonpatchtest_core version={}",
        jsonpatchtest_core::core_version()
    );

    match run_example() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("example failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_example() -> Result<(), Box<dyn Error>> {
    let conn = open_db_in_memory()?;
    let headers = SqliteHeaderRepository::try_new(&conn)?;
    let details = SqliteDetailRepository::try_new(&conn)?;

    let mut header = Header::named("root");
    headers.create_header(&mut header)?;

    let mut detail = Detail::named("child");
    detail.set_header(&header)?;
    details.create_detail(&mut detail)?;

    println!("header={header}");
    println!("detail={detail}");
    if let Some(owner) = details.find_header(&detail)? {
        println!("detail.header={owner}");
    }
    Ok(())
}
