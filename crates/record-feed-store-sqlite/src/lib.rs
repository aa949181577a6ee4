// crates/record-feed-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Record Store
// Description: Durable RecordStore backend using SQLite.
// Purpose: Persist generated records in a single local database file.
// Dependencies: record-feed-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`RecordStore`](record_feed_core::RecordStore)
//! implementation. Every operation opens its own connection and releases it
//! before returning, so no handle is shared between requests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteRecordStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
