// crates/record-feed-core/src/store.rs
// ============================================================================
// Module: Record Feed In-Memory Store
// Description: In-memory record store and shared store wrapper.
// Purpose: Provide a dependency-free store for tests and a clonable handle.
// Dependencies: crate::interfaces, crate::record
// ============================================================================

//! ## Overview
//! [`InMemoryRecordStore`] mirrors the SQLite backend's semantics (schema must
//! exist before writes, ids start at 1, newest first) without touching disk.
//! It is not intended for production use. [`SharedRecordStore`] wraps any
//! backend behind an `Arc` so request handlers can clone it freely.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::interfaces::RecordStore;
use crate::interfaces::StoreError;
use crate::record::InsertTime;
use crate::record::Record;
use crate::record::RecordId;
use crate::record::RecordName;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Mutable state behind the in-memory store.
#[derive(Debug, Default)]
struct InMemoryState {
    /// Whether `ensure_schema` has run.
    schema_ready: bool,
    /// When set, every operation fails as if the medium were gone.
    unavailable: bool,
    /// Last identifier handed out.
    last_id: i64,
    /// Records in insertion order.
    records: Vec<Record>,
}

/// In-memory record store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordStore {
    /// Store state protected by a mutex.
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRecordStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles simulated unavailability for failure-path tests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state mutex is poisoned.
    pub fn set_unavailable(&self, unavailable: bool) -> Result<(), StoreError> {
        self.lock()?.unavailable = unavailable;
        Ok(())
    }

    /// Locks the state, mapping poisoning to a store error.
    fn lock(&self) -> Result<MutexGuard<'_, InMemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Store("mutex poisoned".to_string()))
    }
}

impl InMemoryState {
    /// Fails when the store is unavailable or the schema is missing.
    fn check_writable(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Io("in-memory store unavailable".to_string()));
        }
        if !self.schema_ready {
            return Err(StoreError::Store("no such table: records".to_string()));
        }
        Ok(())
    }

    /// Appends a record and returns its identifier.
    fn append(&mut self, name: &RecordName, insert_time: InsertTime) -> Result<RecordId, StoreError> {
        self.check_writable()?;
        let next = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Corrupt("record id overflow".to_string()))?;
        let id = RecordId::from_raw(next)
            .ok_or_else(|| StoreError::Corrupt(format!("invalid record id {next}")))?;
        self.last_id = next;
        self.records.push(Record {
            id,
            name: name.clone(),
            insert_time,
        });
        Ok(id)
    }

    /// Returns records newest first.
    fn newest_first(&self) -> Result<Vec<Record>, StoreError> {
        self.check_writable()?;
        Ok(self.records.iter().rev().cloned().collect())
    }
}

impl RecordStore for InMemoryRecordStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.unavailable {
            return Err(StoreError::Io("in-memory store unavailable".to_string()));
        }
        state.schema_ready = true;
        drop(state);
        Ok(())
    }

    fn insert(&self, name: &RecordName, insert_time: InsertTime) -> Result<RecordId, StoreError> {
        self.lock()?.append(name, insert_time)
    }

    fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        self.lock()?.newest_first()
    }

    fn append_and_list(
        &self,
        name: &RecordName,
        insert_time: InsertTime,
    ) -> Result<Vec<Record>, StoreError> {
        let mut state = self.lock()?;
        state.append(name, insert_time)?;
        let records = state.newest_first()?;
        drop(state);
        Ok(records)
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared record store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedRecordStore {
    /// Inner store implementation.
    inner: Arc<dyn RecordStore + Send + Sync>,
}

impl SharedRecordStore {
    /// Wraps a record store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl RecordStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }
}

impl RecordStore for SharedRecordStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        self.inner.ensure_schema()
    }

    fn insert(&self, name: &RecordName, insert_time: InsertTime) -> Result<RecordId, StoreError> {
        self.inner.insert(name, insert_time)
    }

    fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        self.inner.list_all()
    }

    fn append_and_list(
        &self,
        name: &RecordName,
        insert_time: InsertTime,
    ) -> Result<Vec<Record>, StoreError> {
        self.inner.append_and_list(name, insert_time)
    }
}
