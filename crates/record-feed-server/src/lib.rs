// crates/record-feed-server/src/lib.rs
// ============================================================================
// Module: Record Feed Server Library
// Description: HTTP service for the record feed.
// Purpose: Serve the poll page and the JSON record endpoints.
// Dependencies: record-feed-core, record-feed-config, axum, tokio
// ============================================================================

//! ## Overview
//! This crate wires a [`record_feed_core::RecordStore`] into an axum router.
//! `GET /api` appends one generated record and returns the full list;
//! `/api/records` offers the same data split into a pure read and a create.
//! Request and lifecycle events are emitted through [`audit::FeedAuditSink`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod page;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FeedAuditSink;
pub use audit::FeedFileAuditSink;
pub use audit::FeedMemoryAuditSink;
pub use audit::FeedNoopAuditSink;
pub use audit::FeedStderrAuditSink;
pub use audit::LifecycleAuditEvent;
pub use audit::LifecycleKind;
pub use audit::RequestAuditEvent;
pub use audit::RequestAuditEventParams;
pub use audit::RequestOutcome;
pub use page::render_page;
pub use server::DB_FAILURE_MESSAGE;
pub use server::FeedServer;
pub use server::FeedServerError;
