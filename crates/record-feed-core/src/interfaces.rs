// crates/record-feed-core/src/interfaces.rs
// ============================================================================
// Module: Record Feed Interfaces
// Description: Persistence interface for append-only records.
// Purpose: Decouple the HTTP service from concrete storage backends.
// Dependencies: crate::record, thiserror
// ============================================================================

//! ## Overview
//! [`RecordStore`] is the seam between the service and its storage. Backends
//! must assign strictly increasing identifiers, never update or delete rows,
//! and return records newest first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::record::InsertTime;
use crate::record::Record;
use crate::record::RecordId;
use crate::record::RecordName;

// ============================================================================
// SECTION: Record Store
// ============================================================================

/// Record store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store could not be opened or accessed.
    #[error("record store io error: {0}")]
    Io(String),
    /// Stored data failed validation.
    #[error("record store corruption: {0}")]
    Corrupt(String),
    /// Stored schema version is incompatible.
    #[error("record store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store configuration or input is invalid.
    #[error("record store invalid data: {0}")]
    Invalid(String),
    /// Storage engine reported an error.
    #[error("record store error: {0}")]
    Store(String),
}

impl StoreError {
    /// Returns a stable label for audit logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Corrupt(_) => "corrupt",
            Self::VersionMismatch(_) => "version_mismatch",
            Self::Invalid(_) => "invalid",
            Self::Store(_) => "store",
        }
    }
}

/// Append-only persistence for records.
pub trait RecordStore {
    /// Creates the records table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unreachable.
    fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Appends one record and returns its store-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn insert(&self, name: &RecordName, insert_time: InsertTime) -> Result<RecordId, StoreError>;

    /// Returns every record, highest identifier first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unreachable or a row is invalid.
    fn list_all(&self) -> Result<Vec<Record>, StoreError>;

    /// Appends one record and returns the full list including it.
    ///
    /// Backends that can do both atomically should override this so a failed
    /// read leaves no new row behind.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when either step fails.
    fn append_and_list(
        &self,
        name: &RecordName,
        insert_time: InsertTime,
    ) -> Result<Vec<Record>, StoreError> {
        self.insert(name, insert_time)?;
        self.list_all()
    }
}
