// crates/record-feed-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Record Store
// Description: Append-only RecordStore backed by a SQLite file.
// Purpose: Persist records with store-assigned ids and connection-per-call.
// Dependencies: record-feed-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteRecordStore`] keeps only its configuration. Each operation opens a
//! fresh [`Connection`], applies pragmas, does its work, and drops the
//! connection on every exit path. Rows read back are validated and fail
//! closed as [`SqliteStoreError::Corrupt`] when malformed.
//!
//! [`SqliteRecordStore::list_read_only`] is the inspection path: it opens the
//! file read-only, applies no journal pragma, and never creates tables.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use record_feed_core::InsertTime;
use record_feed_core::Record;
use record_feed_core::RecordId;
use record_feed_core::RecordName;
use record_feed_core::RecordStore;
use record_feed_core::StoreError;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` record store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a config for `path` with default timeout and pragmas.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Database file could not be opened.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored row failed validation.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed record store using one connection per operation.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    /// Store configuration.
    config: SqliteStoreConfig,
}

impl SqliteRecordStore {
    /// Creates a store for the configured path without opening it.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when the path or timeout is
    /// unusable.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        if config.busy_timeout_ms == 0 {
            return Err(SqliteStoreError::Invalid(
                "busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            config,
        })
    }

    /// Lists every record without writing to the database file.
    ///
    /// A missing file or a database without a `records` table lists as
    /// empty. The schema version is checked when `store_meta` exists.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the file cannot be read, the schema
    /// version is unsupported, or a row is malformed.
    pub fn list_read_only(&self) -> Result<Vec<Record>, SqliteStoreError> {
        if !self.config.path.exists() {
            return Ok(Vec::new());
        }
        let connection = open_read_only_connection(&self.config)?;
        if !table_exists(&connection, "records")? {
            return Ok(Vec::new());
        }
        if table_exists(&connection, "store_meta")? {
            check_schema_version(&connection)?;
        }
        select_newest_first(&connection)
    }

    /// Creates the schema on a fresh connection.
    fn ensure_schema_with_connection(&self) -> Result<(), SqliteStoreError> {
        let mut connection = open_connection(&self.config)?;
        initialize_schema(&mut connection)
    }

    /// Inserts one record on a fresh connection.
    fn insert_with_connection(
        &self,
        name: &RecordName,
        insert_time: InsertTime,
    ) -> Result<RecordId, SqliteStoreError> {
        let connection = open_connection(&self.config)?;
        insert_row(&connection, name, insert_time)
    }

    /// Lists all records on a fresh connection.
    fn list_with_connection(&self) -> Result<Vec<Record>, SqliteStoreError> {
        let connection = open_connection(&self.config)?;
        select_newest_first(&connection)
    }

    /// Inserts and lists inside one transaction on a fresh connection.
    fn append_and_list_with_connection(
        &self,
        name: &RecordName,
        insert_time: InsertTime,
    ) -> Result<Vec<Record>, SqliteStoreError> {
        let mut connection = open_connection(&self.config)?;
        let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        insert_row(&tx, name, insert_time)?;
        let records = select_newest_first(&tx)?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(records)
    }
}

impl RecordStore for SqliteRecordStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        self.ensure_schema_with_connection().map_err(StoreError::from)
    }

    fn insert(&self, name: &RecordName, insert_time: InsertTime) -> Result<RecordId, StoreError> {
        self.insert_with_connection(name, insert_time).map_err(StoreError::from)
    }

    fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        self.list_with_connection().map_err(StoreError::from)
    }

    fn append_and_list(
        &self,
        name: &RecordName,
        insert_time: InsertTime,
    ) -> Result<Vec<Record>, StoreError> {
        self.append_and_list_with_connection(name, insert_time).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Queries
// ============================================================================

/// Inserts a row and returns the assigned identifier.
fn insert_row(
    connection: &Connection,
    name: &RecordName,
    insert_time: InsertTime,
) -> Result<RecordId, SqliteStoreError> {
    let insert_time =
        insert_time.format().map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    connection
        .execute(
            "INSERT INTO records (Name, InsertTime) VALUES (?1, ?2)",
            params![name.as_str(), insert_time],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let raw = connection.last_insert_rowid();
    RecordId::from_raw(raw)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("store assigned invalid id {raw}")))
}

/// Reads every row, highest id first.
fn select_newest_first(connection: &Connection) -> Result<Vec<Record>, SqliteStoreError> {
    let mut statement = connection
        .prepare("SELECT ID, Name, InsertTime FROM records ORDER BY ID DESC")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let rows = statement
        .query_map(params![], |row| {
            let id: i64 = row.get(0)?;
            let name: String = row.get(1)?;
            let insert_time: String = row.get(2)?;
            Ok((id, name, insert_time))
        })
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let mut records = Vec::new();
    for row in rows {
        let (id, name, insert_time) = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        records.push(decode_record(id, name, &insert_time)?);
    }
    Ok(records)
}

/// Validates a raw row into a [`Record`].
fn decode_record(id: i64, name: String, insert_time: &str) -> Result<Record, SqliteStoreError> {
    let record_id = RecordId::from_raw(id)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid record id {id}")))?;
    let name = RecordName::new(name)
        .map_err(|err| SqliteStoreError::Corrupt(format!("record {id}: {err}")))?;
    let insert_time = InsertTime::parse(insert_time)
        .map_err(|err| SqliteStoreError::Corrupt(format!("record {id}: {err}")))?;
    Ok(Record {
        id: record_id,
        name,
        insert_time,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.trim().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must be non-empty".to_string()));
    }
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection and applies pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Io(format!("{}: {err}", config.path.display())))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Opens an existing database read-only with only the busy timeout applied.
fn open_read_only_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Io(format!("{}: {err}", config.path.display())))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(connection)
}

/// Returns true when a table named `name` exists.
fn table_exists(connection: &Connection, name: &str) -> Result<bool, SqliteStoreError> {
    connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |_| Ok(()),
        )
        .optional()
        .map(|found| found.is_some())
        .map_err(|err| SqliteStoreError::Db(err.to_string()))
}

/// Rejects a `store_meta` version other than [`SCHEMA_VERSION`].
fn check_schema_version(connection: &Connection) -> Result<(), SqliteStoreError> {
    let version: Option<i64> = connection
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        Some(value) if value != SCHEMA_VERSION => Err(SqliteStoreError::VersionMismatch(format!(
            "unsupported schema version: {value}"
        ))),
        _ => Ok(()),
    }
}

/// Applies `SQLite` pragmas to a freshly opened connection.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Io(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    // Pre-existing `records` tables without a meta row are adopted as-is.
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS records (
            ID INTEGER PRIMARY KEY AUTOINCREMENT,
            Name TEXT NOT NULL,
            InsertTime DATETIME NOT NULL
        );",
    )
    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}
