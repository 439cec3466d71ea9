//! HTTP session transport.
//!
//! Clients open a session, POST JSON-RPC lines into it and long-poll the
//! session's event outbox for responses. A single worker drains the
//! sessions, so requests execute one at a time in arrival order.

use super::dispatcher::Dispatcher;
use super::protocol;
use crate::session::{SessionEvent, SessionManager};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    #[error("Invalid JSON-RPC message: {0}")]
    InvalidMessage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HttpError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidMessage(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<crate::Error> for HttpError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::InvalidSession(id) => Self::SessionNotFound(id),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Clone)]
pub struct HttpState {
    sessions: Arc<SessionManager>,
    queue: flume::Sender<String>,
    max_poll_wait: Duration,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub after: Option<u64>,
    pub wait_ms: Option<u64>,
}

/// Builds the router and spawns the worker that executes queued requests.
pub fn start(
    dispatcher: Arc<Dispatcher>,
    sessions: Arc<SessionManager>,
    max_poll_wait: Duration,
) -> (Router, JoinHandle<()>) {
    let (queue, jobs) = flume::unbounded();
    let worker = tokio::spawn(run_worker(dispatcher, Arc::clone(&sessions), jobs));

    let state = HttpState {
        sessions,
        queue,
        max_poll_wait,
    };
    (router(state), worker)
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", delete(destroy_session))
        .route("/sessions/{id}/messages", post(post_message))
        .route("/sessions/{id}/events", get(get_events))
        .with_state(state)
}

/// Serves `router` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> crate::Result<()> {
    info!("HTTP transport listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("HTTP transport stopped");
    Ok(())
}

/// Each job is a session id with one newly queued request.
async fn run_worker(
    dispatcher: Arc<Dispatcher>,
    sessions: Arc<SessionManager>,
    jobs: flume::Receiver<String>,
) {
    while let Ok(session_id) = jobs.recv_async().await {
        let request = match sessions.get_next_request(&session_id).await {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                debug!("Skipping job for session {}: {}", session_id, e);
                continue;
            }
        };

        let Some(response) = dispatcher.dispatch(request).await else {
            continue;
        };

        let payload = match serde_json::to_value(&response) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode response for session {}: {}", session_id, e);
                continue;
            }
        };

        if let Err(e) = sessions.push_event(&session_id, payload).await {
            warn!("Dropping response for session {}: {}", session_id, e);
        }
    }
    debug!("HTTP worker stopped");
}

async fn health() -> &'static str {
    "ok"
}

async fn create_session(State(state): State<HttpState>) -> impl IntoResponse {
    let id = state.sessions.create().await;
    (StatusCode::CREATED, Json(json!({ "sessionId": id })))
}

async fn destroy_session(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    if state.sessions.destroy(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HttpError::SessionNotFound(id))
    }
}

async fn post_message(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    body: String,
) -> Result<StatusCode, HttpError> {
    let request = protocol::decode(body.trim()).map_err(|e| {
        warn!("Rejected frame for session {}: {}", id, e);
        HttpError::InvalidMessage(e.to_string())
    })?;

    state.sessions.add_request(&id, request).await?;
    state
        .queue
        .send_async(id)
        .await
        .map_err(|_| HttpError::Internal("Request worker is not running".to_string()))?;

    Ok(StatusCode::ACCEPTED)
}

async fn get_events(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    Query(query): Query<EventsQuery>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let cursor = query
        .after
        .or_else(|| {
            headers
                .get("last-event-id")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        })
        .unwrap_or(0);
    let wait = Duration::from_millis(query.wait_ms.unwrap_or(0)).min(state.max_poll_wait);

    let events = wait_for_events(&state.sessions, &id, cursor, wait).await?;
    let body = render_events(&events)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}

/// Returns events after `cursor`, waiting up to `wait` for the first one.
async fn wait_for_events(
    sessions: &SessionManager,
    id: &str,
    cursor: u64,
    wait: Duration,
) -> crate::Result<Vec<SessionEvent>> {
    let notify = sessions.notifier(id).await?;
    let deadline = tokio::time::Instant::now() + wait;

    loop {
        // Register interest before looking so a push in between is not missed.
        let notified = notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let events = sessions.events_after(id, cursor).await?;
        if !events.is_empty() || tokio::time::Instant::now() >= deadline {
            return Ok(events);
        }

        if tokio::time::timeout_at(deadline, notified).await.is_err() {
            return sessions.events_after(id, cursor).await;
        }
    }
}

fn render_events(events: &[SessionEvent]) -> Result<String, HttpError> {
    let mut body = String::new();
    for event in events {
        let data = serde_json::to_string(&event.payload)
            .map_err(|e| HttpError::Internal(e.to_string()))?;
        body.push_str(&format!("id: {}\ndata: {}\n\n", event.id, data));
    }
    Ok(body)
}
