// crates/record-feed-server/src/audit.rs
// ============================================================================
// Module: Record Feed Audit Logging
// Description: Structured audit events for HTTP requests and server lifecycle.
// Purpose: Emit JSON-line logs without a logging framework dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Audit events are serialized as one JSON object per line. Sinks decide
//! where the line goes: stderr, an append-only file, nowhere, or an
//! in-memory buffer that tests can inspect. Sink failures are swallowed so a
//! broken log target never fails a request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Request completed successfully.
    Ok,
    /// Request failed with a store error.
    Error,
}

/// Server lifecycle milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    /// Listener bound and accepting connections.
    ServerStarted,
    /// Record schema confirmed present.
    SchemaReady,
    /// Schema creation failed; requests will retry it.
    SchemaPending,
    /// Listener shut down.
    ServerStopped,
}

/// HTTP request audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// HTTP method.
    pub method: &'static str,
    /// Matched route path.
    pub route: &'static str,
    /// HTTP status code returned.
    pub status: u16,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// Number of records in the response body, when any were returned.
    pub record_count: Option<usize>,
    /// Normalized store error kind label.
    pub error_kind: Option<&'static str>,
    /// Time spent handling the request (ms).
    pub latency_ms: u128,
}

/// Inputs required to construct a request audit event.
pub struct RequestAuditEventParams {
    /// HTTP method.
    pub method: &'static str,
    /// Matched route path.
    pub route: &'static str,
    /// HTTP status code returned.
    pub status: u16,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// Number of records in the response body.
    pub record_count: Option<usize>,
    /// Normalized store error kind label.
    pub error_kind: Option<&'static str>,
    /// Time spent handling the request (ms).
    pub latency_ms: u128,
}

impl RequestAuditEvent {
    /// Creates a new request audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: RequestAuditEventParams) -> Self {
        Self {
            event: "http_request",
            timestamp_ms: timestamp_ms(),
            method: params.method,
            route: params.route,
            status: params.status,
            outcome: params.outcome,
            record_count: params.record_count,
            error_kind: params.error_kind,
            latency_ms: params.latency_ms,
        }
    }
}

/// Server lifecycle audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Lifecycle milestone.
    pub kind: LifecycleKind,
    /// Human-readable detail.
    pub message: Option<String>,
}

impl LifecycleAuditEvent {
    /// Creates a new lifecycle audit event with a consistent timestamp.
    #[must_use]
    pub fn new(kind: LifecycleKind, message: Option<String>) -> Self {
        Self {
            event: "lifecycle",
            timestamp_ms: timestamp_ms(),
            kind,
            message,
        }
    }
}

/// Milliseconds since the Unix epoch, or zero if the clock is before it.
fn timestamp_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for record feed events.
pub trait FeedAuditSink: Send + Sync {
    /// Record an HTTP request event.
    fn record_request(&self, event: &RequestAuditEvent);

    /// Record a lifecycle event.
    fn record_lifecycle(&self, _event: &LifecycleAuditEvent) {}
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that logs JSON lines to stderr.
pub struct FeedStderrAuditSink;

impl FeedAuditSink for FeedStderrAuditSink {
    fn record_request(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_lifecycle(&self, event: &LifecycleAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FeedFileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FeedFileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized line.
    fn write_line(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl FeedAuditSink for FeedFileAuditSink {
    fn record_request(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }

    fn record_lifecycle(&self, event: &LifecycleAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }
}

/// No-op audit sink.
pub struct FeedNoopAuditSink;

impl FeedAuditSink for FeedNoopAuditSink {
    fn record_request(&self, _event: &RequestAuditEvent) {}

    fn record_lifecycle(&self, _event: &LifecycleAuditEvent) {}
}

/// Audit sink that buffers events in memory.
#[derive(Default)]
pub struct FeedMemoryAuditSink {
    /// Captured request events, oldest first.
    requests: Mutex<Vec<RequestAuditEvent>>,
    /// Captured lifecycle events, oldest first.
    lifecycle: Mutex<Vec<LifecycleAuditEvent>>,
}

impl FeedMemoryAuditSink {
    /// Creates an empty capturing sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of captured request events.
    #[must_use]
    pub fn requests(&self) -> Vec<RequestAuditEvent> {
        self.requests.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns a snapshot of captured lifecycle events.
    #[must_use]
    pub fn lifecycle(&self) -> Vec<LifecycleAuditEvent> {
        self.lifecycle.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl FeedAuditSink for FeedMemoryAuditSink {
    fn record_request(&self, event: &RequestAuditEvent) {
        if let Ok(mut events) = self.requests.lock() {
            events.push(event.clone());
        }
    }

    fn record_lifecycle(&self, event: &LifecycleAuditEvent) {
        if let Ok(mut events) = self.lifecycle.lock() {
            events.push(event.clone());
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
