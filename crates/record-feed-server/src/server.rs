// crates/record-feed-server/src/server.rs
// ============================================================================
// Module: Record Feed Server
// Description: axum HTTP service over a RecordStore.
// Purpose: Expose the poll page and JSON record endpoints.
// Dependencies: record-feed-core, record-feed-config, axum, tokio
// ============================================================================

//! ## Overview
//! [`FeedServer`] owns the store handle, the audit sink, and the rendered poll
//! page. The record schema is ensured once at construction; if that fails the
//! server still starts and each store-backed request retries it until one
//! succeeds. Store calls run on the blocking pool. Any store failure maps to
//! `500` with [`DB_FAILURE_MESSAGE`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use record_feed_config::RecordFeedConfig;
use record_feed_config::ServerAuditConfig;
use record_feed_core::InsertTime;
use record_feed_core::Record;
use record_feed_core::RecordName;
use record_feed_core::RecordStore;
use record_feed_core::SharedRecordStore;
use record_feed_core::StoreError;
use record_feed_store_sqlite::SqliteRecordStore;
use serde::Serialize;
use tokio::net::TcpListener;

use crate::audit::FeedAuditSink;
use crate::audit::FeedFileAuditSink;
use crate::audit::FeedNoopAuditSink;
use crate::audit::FeedStderrAuditSink;
use crate::audit::LifecycleAuditEvent;
use crate::audit::LifecycleKind;
use crate::audit::RequestAuditEvent;
use crate::audit::RequestAuditEventParams;
use crate::audit::RequestOutcome;
use crate::page::render_page;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Error message returned with every store failure.
pub const DB_FAILURE_MESSAGE: &str = "Database connection failed";

/// `GET /` route label.
const PAGE_ROUTE: RouteLabel = RouteLabel {
    method: "GET",
    route: "/",
};
/// `GET /api` route label.
const FEED_ROUTE: RouteLabel = RouteLabel {
    method: "GET",
    route: "/api",
};
/// `GET /api/records` route label.
const LIST_ROUTE: RouteLabel = RouteLabel {
    method: "GET",
    route: "/api/records",
};
/// `POST /api/records` route label.
const CREATE_ROUTE: RouteLabel = RouteLabel {
    method: "POST",
    route: "/api/records",
};

// ============================================================================
// SECTION: Server
// ============================================================================

/// Record feed HTTP server.
pub struct FeedServer {
    /// Server configuration.
    config: RecordFeedConfig,
    /// Shared handler state.
    state: Arc<ServerState>,
}

impl FeedServer {
    /// Builds a server backed by the configured `SQLite` store.
    ///
    /// # Errors
    ///
    /// Returns [`FeedServerError`] when the config is invalid, the store path
    /// is unusable, or the audit log cannot be opened.
    pub fn from_config(config: RecordFeedConfig) -> Result<Self, FeedServerError> {
        config.validate().map_err(|err| FeedServerError::Config(err.to_string()))?;
        let store = SqliteRecordStore::new(config.store.to_sqlite_config())
            .map_err(|err| FeedServerError::Init(err.to_string()))?;
        let audit = build_audit_sink(&config.server.audit)?;
        Ok(Self::with_store(config, SharedRecordStore::from_store(store), audit))
    }

    /// Builds a server over an existing store and audit sink.
    ///
    /// Attempts schema creation immediately; a failure leaves the server in
    /// the schema-pending state rather than refusing to start.
    #[must_use]
    pub fn with_store(
        config: RecordFeedConfig,
        store: SharedRecordStore,
        audit: Arc<dyn FeedAuditSink>,
    ) -> Self {
        let page = render_page(config.server.poll_interval_ms);
        let state = Arc::new(ServerState {
            store,
            schema_ready: AtomicBool::new(false),
            audit,
            page,
        });
        if let Err(err) = state.ensure_schema_once() {
            state.audit.record_lifecycle(&LifecycleAuditEvent::new(
                LifecycleKind::SchemaPending,
                Some(err.to_string()),
            ));
        }
        Self {
            config,
            state,
        }
    }

    /// Returns true once the record schema has been confirmed.
    #[must_use]
    pub fn schema_ready(&self) -> bool {
        self.state.schema_ready.load(Ordering::Acquire)
    }

    /// Builds the axum router for all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(handle_page))
            .route("/api", get(handle_feed))
            .route("/api/records", get(handle_list).post(handle_create))
            .with_state(Arc::clone(&self.state))
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`FeedServerError`] when binding or serving fails.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), FeedServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr =
            self.config.server.bind_addr().map_err(|err| FeedServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| FeedServerError::Transport(format!("http bind failed: {err}")))?;
        self.serve_with_listener(listener, shutdown).await
    }

    /// Serves on an already-bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`FeedServerError::Transport`] when the server fails.
    pub async fn serve_with_listener<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), FeedServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|err| FeedServerError::Transport(format!("http bind failed: {err}")))?;
        self.state.audit.record_lifecycle(&LifecycleAuditEvent::new(
            LifecycleKind::ServerStarted,
            Some(format!("listening on http://{addr}")),
        ));
        let app = self.router();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| FeedServerError::Transport(format!("http server failed: {err}")));
        self.state.audit.record_lifecycle(&LifecycleAuditEvent::new(
            LifecycleKind::ServerStopped,
            None,
        ));
        result
    }
}

/// Builds the audit sink selected by configuration.
fn build_audit_sink(config: &ServerAuditConfig) -> Result<Arc<dyn FeedAuditSink>, FeedServerError> {
    if !config.enabled {
        return Ok(Arc::new(FeedNoopAuditSink));
    }
    match &config.path {
        Some(path) => {
            let sink = FeedFileAuditSink::new(Path::new(path))
                .map_err(|err| FeedServerError::Init(format!("audit log {path}: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(FeedStderrAuditSink)),
    }
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state for HTTP handlers.
struct ServerState {
    /// Record store handle.
    store: SharedRecordStore,
    /// Set once `ensure_schema` has succeeded.
    schema_ready: AtomicBool,
    /// Audit sink for request and lifecycle events.
    audit: Arc<dyn FeedAuditSink>,
    /// Rendered poll page.
    page: String,
}

impl ServerState {
    /// Ensures the schema unless a previous call already succeeded.
    fn ensure_schema_once(&self) -> Result<(), StoreError> {
        if self.schema_ready.load(Ordering::Acquire) {
            return Ok(());
        }
        self.store.ensure_schema()?;
        if !self.schema_ready.swap(true, Ordering::AcqRel) {
            self.audit.record_lifecycle(&LifecycleAuditEvent::new(LifecycleKind::SchemaReady, None));
        }
        Ok(())
    }
}

/// Method and path pair used for audit labels.
#[derive(Clone, Copy)]
struct RouteLabel {
    /// HTTP method.
    method: &'static str,
    /// Route path.
    route: &'static str,
}

/// Body returned with every store failure.
#[derive(Serialize)]
struct ErrorBody {
    /// Fixed error message.
    error: &'static str,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Serves the poll page.
async fn handle_page(State(state): State<Arc<ServerState>>) -> Response {
    let started = Instant::now();
    let response = Html(state.page.clone()).into_response();
    record_request(&state, PAGE_ROUTE, started, StatusCode::OK, None, None);
    response
}

/// Appends one generated record and returns the full list.
async fn handle_feed(State(state): State<Arc<ServerState>>) -> Response {
    let started = Instant::now();
    let result = run_store_call(&state, |store| {
        store.append_and_list(&RecordName::generate(), InsertTime::now())
    })
    .await;
    finish_records(&state, FEED_ROUTE, started, StatusCode::OK, result)
}

/// Returns the full list without writing.
async fn handle_list(State(state): State<Arc<ServerState>>) -> Response {
    let started = Instant::now();
    let result = run_store_call(&state, |store| store.list_all()).await;
    finish_records(&state, LIST_ROUTE, started, StatusCode::OK, result)
}

/// Appends one generated record and returns it.
async fn handle_create(State(state): State<Arc<ServerState>>) -> Response {
    let started = Instant::now();
    let result = run_store_call(&state, |store| {
        let name = RecordName::generate();
        let insert_time = InsertTime::now();
        let id = store.insert(&name, insert_time)?;
        Ok(Record {
            id,
            name,
            insert_time,
        })
    })
    .await;
    match result {
        Ok(record) => {
            record_request(&state, CREATE_ROUTE, started, StatusCode::CREATED, Some(1), None);
            (StatusCode::CREATED, Json(record)).into_response()
        }
        Err(err) => store_failure(&state, CREATE_ROUTE, started, &err),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs a store call on the blocking pool after ensuring the schema.
async fn run_store_call<T, F>(state: &Arc<ServerState>, call: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&SharedRecordStore) -> Result<T, StoreError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || {
        state.ensure_schema_once()?;
        call(&state.store)
    })
    .await
    .map_err(|err| StoreError::Store(format!("store task failed: {err}")))?
}

/// Renders a record list response or a store failure.
fn finish_records(
    state: &ServerState,
    label: RouteLabel,
    started: Instant,
    status: StatusCode,
    result: Result<Vec<Record>, StoreError>,
) -> Response {
    match result {
        Ok(records) => {
            record_request(state, label, started, status, Some(records.len()), None);
            (status, Json(records)).into_response()
        }
        Err(err) => store_failure(state, label, started, &err),
    }
}

/// Renders the fixed `500` body for a store failure.
fn store_failure(
    state: &ServerState,
    label: RouteLabel,
    started: Instant,
    err: &StoreError,
) -> Response {
    let status = StatusCode::INTERNAL_SERVER_ERROR;
    record_request(state, label, started, status, None, Some(err.kind()));
    (
        status,
        Json(ErrorBody {
            error: DB_FAILURE_MESSAGE,
        }),
    )
        .into_response()
}

/// Emits a request audit event.
fn record_request(
    state: &ServerState,
    label: RouteLabel,
    started: Instant,
    status: StatusCode,
    record_count: Option<usize>,
    error_kind: Option<&'static str>,
) {
    let outcome = if error_kind.is_some() { RequestOutcome::Error } else { RequestOutcome::Ok };
    state.audit.record_request(&RequestAuditEvent::new(RequestAuditEventParams {
        method: label.method,
        route: label.route,
        status: status.as_u16(),
        outcome,
        record_count,
        error_kind,
        latency_ms: started.elapsed().as_millis(),
    }));
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Record feed server errors.
#[derive(Debug, thiserror::Error)]
pub enum FeedServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
