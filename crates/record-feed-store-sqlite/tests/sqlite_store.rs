// crates/record-feed-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Store Tests
// Description: Validate SQLite RecordStore behavior.
// Purpose: Ensure append-only persistence, ordering, and fail-closed reads.
// Dependencies: record-feed-store-sqlite, record-feed-core, rusqlite, tempfile
// ============================================================================

//! ## Overview
//! Conformance tests for the SQLite-backed record store. Exercises schema
//! idempotence, id assignment, durability across store instances, and
//! detection of malformed rows written behind the store's back.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;

use record_feed_core::InsertTime;
use record_feed_core::RecordName;
use record_feed_core::RecordStore;
use record_feed_core::StoreError;
use record_feed_store_sqlite::SqliteRecordStore;
use record_feed_store_sqlite::SqliteStoreConfig;
use record_feed_store_sqlite::SqliteStoreError;
use record_feed_store_sqlite::SqliteStoreMode;
use record_feed_store_sqlite::SqliteSyncMode;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn store_for(path: &Path) -> SqliteRecordStore {
    let config = SqliteStoreConfig {
        path: path.to_path_buf(),
        busy_timeout_ms: 1_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Full,
    };
    SqliteRecordStore::new(config).expect("store init")
}

fn ready_store(temp: &TempDir) -> SqliteRecordStore {
    let store = store_for(&temp.path().join("records.sqlite"));
    store.ensure_schema().unwrap();
    store
}

fn ids_of(store: &SqliteRecordStore) -> Vec<i64> {
    store.list_all().unwrap().iter().map(|record| record.id.get()).collect()
}

fn row_count(path: &Path) -> i64 {
    let connection = rusqlite::Connection::open(path).unwrap();
    connection.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0)).unwrap()
}

fn table_names(path: &Path) -> Vec<String> {
    let connection = rusqlite::Connection::open(path).unwrap();
    let mut statement = connection
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    statement.query_map([], |row| row.get::<_, String>(0)).unwrap().map(Result::unwrap).collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn construction_does_not_touch_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("records.sqlite");
    let _store = store_for(&path);
    assert!(!path.exists());
}

#[test]
fn fresh_store_lists_nothing() {
    let temp = TempDir::new().unwrap();
    let store = ready_store(&temp);
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn ensure_schema_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let store = ready_store(&temp);
    store.insert(&RecordName::generate(), InsertTime::now()).unwrap();
    store.ensure_schema().unwrap();
    store.ensure_schema().unwrap();
    assert_eq!(ids_of(&store), vec![1]);
}

#[test]
fn insert_assigns_increasing_ids_and_lists_newest_first() {
    let temp = TempDir::new().unwrap();
    let store = ready_store(&temp);
    let mut assigned = Vec::new();
    for _ in 0..3 {
        assigned.push(store.insert(&RecordName::generate(), InsertTime::now()).unwrap().get());
    }
    assert_eq!(assigned, vec![1, 2, 3]);
    assert_eq!(ids_of(&store), vec![3, 2, 1]);
}

#[test]
fn insert_persists_name_and_time() {
    let temp = TempDir::new().unwrap();
    let store = ready_store(&temp);
    let name = RecordName::new("Q1W2E3R4T5").unwrap();
    let time = InsertTime::now();
    store.insert(&name, time).unwrap();
    let records = store.list_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, name);
    assert_eq!(records[0].insert_time, time);
}

#[test]
fn append_and_list_returns_new_record_first() {
    let temp = TempDir::new().unwrap();
    let store = ready_store(&temp);
    let first = store.append_and_list(&RecordName::generate(), InsertTime::now()).unwrap();
    assert_eq!(first.len(), 1);
    let second = store.append_and_list(&RecordName::generate(), InsertTime::now()).unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].id.get(), 2);
    assert_eq!(second[1], first[0]);
    assert!(second[1].insert_time <= second[0].insert_time);
}

#[test]
fn records_persist_across_instances() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("records.sqlite");
    {
        let store = store_for(&path);
        store.ensure_schema().unwrap();
        store.insert(&RecordName::generate(), InsertTime::now()).unwrap();
    }
    let store = store_for(&path);
    store.ensure_schema().unwrap();
    store.insert(&RecordName::generate(), InsertTime::now()).unwrap();
    assert_eq!(ids_of(&store), vec![2, 1]);
}

#[test]
fn insert_without_schema_fails() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("records.sqlite"));
    let err = store.insert(&RecordName::generate(), InsertTime::now()).unwrap_err();
    assert!(matches!(err, StoreError::Store(_)), "unexpected error: {err}");
}

#[test]
fn unreachable_path_reports_io_and_persists_nothing() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    let store = store_for(&blocker.join("records.sqlite"));
    assert!(matches!(store.ensure_schema(), Err(StoreError::Io(_))));
    let err = store.append_and_list(&RecordName::generate(), InsertTime::now()).unwrap_err();
    assert_eq!(err.kind(), "io");
    assert_eq!(std::fs::read(&blocker).unwrap(), b"file");
}

#[test]
fn directory_path_is_rejected() {
    let temp = TempDir::new().unwrap();
    let err = SqliteRecordStore::new(SqliteStoreConfig::with_path(temp.path())).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn overlong_path_component_is_rejected() {
    let long = "a".repeat(300);
    let err = SqliteRecordStore::new(SqliteStoreConfig::with_path(long)).unwrap_err();
    assert!(err.to_string().contains("overlong component"));
}

#[test]
fn zero_busy_timeout_is_rejected() {
    let temp = TempDir::new().unwrap();
    let mut config = SqliteStoreConfig::with_path(temp.path().join("records.sqlite"));
    config.busy_timeout_ms = 0;
    assert!(SqliteRecordStore::new(config).is_err());
}

#[test]
fn malformed_name_fails_closed() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("records.sqlite");
    let store = store_for(&path);
    store.ensure_schema().unwrap();
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection
            .execute(
                "INSERT INTO records (Name, InsertTime) VALUES (?1, ?2)",
                rusqlite::params!["lower", "2024-01-01 00:00:00.000000"],
            )
            .unwrap();
    }
    let err = store.list_all().unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)), "unexpected error: {err}");
}

#[test]
fn malformed_insert_time_fails_closed() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("records.sqlite");
    let store = store_for(&path);
    store.ensure_schema().unwrap();
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection
            .execute(
                "INSERT INTO records (Name, InsertTime) VALUES (?1, ?2)",
                rusqlite::params!["ABCDEFGHIJ", "not a timestamp"],
            )
            .unwrap();
    }
    assert!(matches!(store.list_all(), Err(StoreError::Corrupt(_))));
}

#[test]
fn legacy_table_without_meta_is_adopted() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("records.sqlite");
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection
            .execute_batch(
                "CREATE TABLE records (
                    ID INTEGER PRIMARY KEY AUTOINCREMENT,
                    Name TEXT NOT NULL,
                    InsertTime DATETIME NOT NULL
                );
                INSERT INTO records (Name, InsertTime)
                    VALUES ('LEGACY0001', '2023-06-01 12:30:45');",
            )
            .unwrap();
    }
    let store = store_for(&path);
    store.ensure_schema().unwrap();
    let records = store.append_and_list(&RecordName::generate(), InsertTime::now()).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].name.as_str(), "LEGACY0001");
    assert_eq!(records[1].insert_time.to_string(), "2023-06-01 12:30:45.000000");
}

#[test]
fn unknown_schema_version_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("records.sqlite");
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection
            .execute_batch(
                "CREATE TABLE store_meta (version INTEGER NOT NULL);
                 INSERT INTO store_meta (version) VALUES (99);",
            )
            .unwrap();
    }
    let store = store_for(&path);
    assert!(matches!(store.ensure_schema(), Err(StoreError::VersionMismatch(_))));
}

#[test]
fn delete_journal_mode_works() {
    let temp = TempDir::new().unwrap();
    let mut config = SqliteStoreConfig::with_path(temp.path().join("records.sqlite"));
    config.journal_mode = SqliteStoreMode::Delete;
    config.sync_mode = SqliteSyncMode::Normal;
    let store = SqliteRecordStore::new(config).unwrap();
    store.ensure_schema().unwrap();
    store.insert(&RecordName::generate(), InsertTime::now()).unwrap();
    assert_eq!(ids_of(&store), vec![1]);
}

#[test]
fn concurrent_appends_assign_unique_ids() {
    const THREADS: usize = 8;
    const APPENDS_PER_THREAD: usize = 25;

    let temp = TempDir::new().unwrap();
    let config = SqliteStoreConfig::with_path(temp.path().join("records.sqlite"));
    let store = SqliteRecordStore::new(config).unwrap();
    store.ensure_schema().unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = store.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut own_ids = Vec::with_capacity(APPENDS_PER_THREAD);
                for _ in 0..APPENDS_PER_THREAD {
                    let records =
                        store.append_and_list(&RecordName::generate(), InsertTime::now())?;
                    own_ids.push(records[0].id.get());
                }
                Ok::<_, StoreError>(own_ids)
            })
        })
        .collect();

    let mut returned = BTreeSet::new();
    for handle in handles {
        let own_ids = handle.join().expect("writer thread").expect("append_and_list");
        for id in own_ids {
            assert!(returned.insert(id), "id {id} returned to two writers");
        }
    }
    let total = THREADS * APPENDS_PER_THREAD;
    assert_eq!(returned.len(), total);

    let listed = ids_of(&store);
    assert_eq!(listed.len(), total);
    let unique: BTreeSet<i64> = listed.iter().copied().collect();
    assert_eq!(unique, returned);
    assert!(listed.windows(2).all(|pair| pair[0] > pair[1]));
}

#[test]
fn failed_read_rolls_back_append() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("records.sqlite");
    let store = store_for(&path);
    store.ensure_schema().unwrap();
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection
            .execute(
                "INSERT INTO records (Name, InsertTime) VALUES (?1, ?2)",
                rusqlite::params!["bad name", "2024-01-01 00:00:00.000000"],
            )
            .unwrap();
    }
    assert_eq!(row_count(&path), 1);

    let err = store.append_and_list(&RecordName::generate(), InsertTime::now()).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)), "unexpected error: {err}");
    assert_eq!(row_count(&path), 1);
}

#[test]
fn read_only_list_of_missing_file_is_empty_and_creates_nothing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.sqlite");
    let store = store_for(&path);
    assert!(store.list_read_only().unwrap().is_empty());
    assert!(!path.exists());
}

#[test]
fn read_only_list_matches_list_all() {
    let temp = TempDir::new().unwrap();
    let store = ready_store(&temp);
    for _ in 0..3 {
        store.insert(&RecordName::generate(), InsertTime::now()).unwrap();
    }
    assert_eq!(store.list_read_only().unwrap(), store.list_all().unwrap());
}

#[test]
fn read_only_list_does_not_adopt_legacy_table() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("legacy.sqlite");
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection
            .execute_batch(
                "CREATE TABLE records (
                    ID INTEGER PRIMARY KEY AUTOINCREMENT,
                    Name TEXT NOT NULL,
                    InsertTime DATETIME NOT NULL
                );
                INSERT INTO records (Name, InsertTime)
                    VALUES ('LEGACY0001', '2023-06-01 12:30:45');",
            )
            .unwrap();
    }
    let tables_before = table_names(&path);
    let records = store_for(&path).list_read_only().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name.as_str(), "LEGACY0001");
    assert_eq!(table_names(&path), tables_before);
}

#[test]
fn read_only_list_without_records_table_is_empty() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("other.sqlite");
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection.execute_batch("CREATE TABLE unrelated (value TEXT);").unwrap();
    }
    assert!(store_for(&path).list_read_only().unwrap().is_empty());
    assert_eq!(table_names(&path), vec!["unrelated".to_string()]);
}

#[test]
fn read_only_list_rejects_unknown_schema_version() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("future.sqlite");
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection
            .execute_batch(
                "CREATE TABLE store_meta (version INTEGER NOT NULL);
                 INSERT INTO store_meta (version) VALUES (99);
                 CREATE TABLE records (
                     ID INTEGER PRIMARY KEY AUTOINCREMENT,
                     Name TEXT NOT NULL,
                     InsertTime DATETIME NOT NULL
                 );",
            )
            .unwrap();
    }
    let err = store_for(&path).list_read_only().unwrap_err();
    assert!(matches!(err, SqliteStoreError::VersionMismatch(_)), "unexpected error: {err}");
}
