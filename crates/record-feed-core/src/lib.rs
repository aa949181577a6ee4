// crates/record-feed-core/src/lib.rs
// ============================================================================
// Module: Record Feed Core Library
// Description: Public API surface for the Record Feed core.
// Purpose: Expose the record model, store interface, and in-memory stores.
// Dependencies: crate::{record, interfaces, store}
// ============================================================================

//! ## Overview
//! Record Feed core defines the append-only [`Record`] entity, the
//! [`RecordStore`] persistence interface, and backend-agnostic helpers used by
//! the SQLite store and the HTTP service. Storage backends live in their own
//! crates and integrate through [`RecordStore`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod interfaces;
pub mod record;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use interfaces::RecordStore;
pub use interfaces::StoreError;
pub use record::InsertTime;
pub use record::NAME_ALPHABET;
pub use record::NAME_LENGTH;
pub use record::Record;
pub use record::RecordError;
pub use record::RecordId;
pub use record::RecordName;
pub use store::InMemoryRecordStore;
pub use store::SharedRecordStore;
