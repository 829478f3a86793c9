use jsonpatchtest_core::db::migrations::latest_version;
use jsonpatchtest_core::db::open_db_in_memory;
use jsonpatchtest_core::{
    Detail, DetailRepository, Header, HeaderDeletePolicy, HeaderListQuery, HeaderRepository,
    RepoError, SqliteDetailRepository, SqliteHeaderRepository,
};
use rusqlite::Connection;

#[test]
fn create_assigns_generated_id_and_get_roundtrips() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHeaderRepository::try_new(&conn).unwrap();

    let mut header = Header::named("root");
    assert_eq!(header.id(), None);
    let id = repo.create_header(&mut header).unwrap();

    assert_eq!(id, 1);
    assert_eq!(header.id(), Some(1));
    let loaded = repo.get_header(id).unwrap().unwrap();
    assert_eq!(loaded, header);
}

#[test]
fn generated_ids_are_unique() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHeaderRepository::try_new(&conn).unwrap();

    let mut first = Header::named("a");
    let mut second = Header::named("a");
    repo.create_header(&mut first).unwrap();
    repo.create_header(&mut second).unwrap();

    assert_ne!(first.id(), second.id());
    assert_ne!(first, second);
}

#[test]
fn create_rejects_already_persisted_header() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHeaderRepository::try_new(&conn).unwrap();

    let mut header = Header::named("root");
    repo.create_header(&mut header).unwrap();

    let err = repo.create_header(&mut header).unwrap_err();
    assert!(matches!(
        err,
        RepoError::AlreadyPersisted {
            entity: "header",
            id: 1
        }
    ));
    assert_eq!(header.id(), Some(1));
}

#[test]
fn header_without_name_is_persisted_as_null() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHeaderRepository::try_new(&conn).unwrap();

    let mut header = Header::default();
    let id = repo.create_header(&mut header).unwrap();

    let loaded = repo.get_header(id).unwrap().unwrap();
    assert_eq!(loaded.name(), None);
}

#[test]
fn update_existing_header() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHeaderRepository::try_new(&conn).unwrap();

    let mut header = Header::named("draft");
    let id = repo.create_header(&mut header).unwrap();

    header.set_name(Some("final".to_string()));
    repo.update_header(&header).unwrap();

    let loaded = repo.get_header(id).unwrap().unwrap();
    assert_eq!(loaded.name(), Some("final"));
    assert_eq!(loaded.id(), Some(id));
}

#[test]
fn update_transient_or_missing_header_fails() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHeaderRepository::try_new(&conn).unwrap();

    let err = repo.update_header(&Header::named("unsaved")).unwrap_err();
    assert!(matches!(err, RepoError::Transient("header")));

    let missing = Header::with_id(99, None).unwrap();
    let err = repo.update_header(&missing).unwrap_err();
    assert!(matches!(err, RepoError::HeaderNotFound(99)));
}

#[test]
fn get_missing_header_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHeaderRepository::try_new(&conn).unwrap();

    assert!(repo.get_header(12).unwrap().is_none());
}

#[test]
fn list_headers_is_ordered_and_paginated() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHeaderRepository::try_new(&conn).unwrap();

    for name in ["a", "b", "c", "d"] {
        repo.create_header(&mut Header::named(name)).unwrap();
    }

    let all = repo.list_headers(&HeaderListQuery::default()).unwrap();
    let names: Vec<_> = all.iter().map(|header| header.name().unwrap()).collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);

    let page = repo
        .list_headers(&HeaderListQuery {
            limit: Some(2),
            offset: 1,
        })
        .unwrap();
    let ids: Vec<_> = page.iter().map(|header| header.id().unwrap()).collect();
    assert_eq!(ids, vec![2, 3]);

    let tail = repo
        .list_headers(&HeaderListQuery {
            limit: None,
            offset: 3,
        })
        .unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].name(), Some("d"));
}

#[test]
fn delete_restrict_blocks_referenced_header() {
    let conn = open_db_in_memory().unwrap();
    let headers = SqliteHeaderRepository::try_new(&conn).unwrap();
    let details = SqliteDetailRepository::try_new(&conn).unwrap();

    let (header_id, _) = header_with_details(&headers, &details, 2);

    let err = headers
        .delete_header(header_id, HeaderDeletePolicy::Restrict)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::HeaderInUse {
            id,
            detail_count: 2
        } if id == header_id
    ));
    assert!(headers.get_header(header_id).unwrap().is_some());
    assert_eq!(headers.count_details(header_id).unwrap(), 2);
}

#[test]
fn delete_restrict_removes_unreferenced_header() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHeaderRepository::try_new(&conn).unwrap();

    let mut header = Header::named("lonely");
    let id = repo.create_header(&mut header).unwrap();

    repo.delete_header(id, HeaderDeletePolicy::default()).unwrap();
    assert!(repo.get_header(id).unwrap().is_none());
}

#[test]
fn delete_detach_keeps_details_unattached() {
    let conn = open_db_in_memory().unwrap();
    let headers = SqliteHeaderRepository::try_new(&conn).unwrap();
    let details = SqliteDetailRepository::try_new(&conn).unwrap();

    let (header_id, detail_ids) = header_with_details(&headers, &details, 2);

    headers
        .delete_header(header_id, HeaderDeletePolicy::Detach)
        .unwrap();

    assert!(headers.get_header(header_id).unwrap().is_none());
    for detail_id in detail_ids {
        let detail = details.get_detail(detail_id).unwrap().unwrap();
        assert_eq!(detail.header_id(), None);
    }
}

#[test]
fn delete_cascade_removes_details() {
    let conn = open_db_in_memory().unwrap();
    let headers = SqliteHeaderRepository::try_new(&conn).unwrap();
    let details = SqliteDetailRepository::try_new(&conn).unwrap();

    let (header_id, detail_ids) = header_with_details(&headers, &details, 3);
    let (other_header_id, other_detail_ids) = header_with_details(&headers, &details, 1);

    headers
        .delete_header(header_id, HeaderDeletePolicy::Cascade)
        .unwrap();

    assert!(headers.get_header(header_id).unwrap().is_none());
    for detail_id in detail_ids {
        assert!(details.get_detail(detail_id).unwrap().is_none());
    }
    assert!(headers.get_header(other_header_id).unwrap().is_some());
    assert!(details.get_detail(other_detail_ids[0]).unwrap().is_some());
}

#[test]
fn delete_missing_header_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHeaderRepository::try_new(&conn).unwrap();

    for policy in [
        HeaderDeletePolicy::Restrict,
        HeaderDeletePolicy::Detach,
        HeaderDeletePolicy::Cascade,
    ] {
        let err = repo.delete_header(8, policy).unwrap_err();
        assert!(matches!(err, RepoError::HeaderNotFound(8)));
    }
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteHeaderRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_header_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteHeaderRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("header"))
    ));
}

#[test]
fn repository_rejects_connection_missing_name_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE header (id INTEGER PRIMARY KEY AUTOINCREMENT);")
        .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteHeaderRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "header",
            column: "name"
        })
    ));
}

fn header_with_details(
    headers: &SqliteHeaderRepository<'_>,
    details: &SqliteDetailRepository<'_>,
    count: usize,
) -> (i64, Vec<i64>) {
    let mut header = Header::named("owner");
    let header_id = headers.create_header(&mut header).unwrap();

    let detail_ids = (0..count)
        .map(|index| {
            let mut detail = Detail::named(format!("child-{index}"));
            detail.set_header(&header).unwrap();
            details.create_detail(&mut detail).unwrap()
        })
        .collect();

    (header_id, detail_ids)
}
