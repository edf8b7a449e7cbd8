//! HTTP routes
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /` | health check |
//! | `POST /mcp` | streamable HTTP: one JSON-RPC message or a batch, JSON reply |
//! | `DELETE /mcp` | end a streamable HTTP session |
//! | `GET /sse` | legacy SSE stream; first event names the message endpoint |
//! | `POST /messages/?session_id=` | legacy SSE message intake, reply pushed on the stream |

use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::handler::{contains_initialize, SERVER_NAME};
use super::session::SessionGuard;
use super::AppState;
use crate::mcp::types::{JsonRpcError, JsonRpcResponse};

/// Header carrying the streamable HTTP session id
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Path announced in the SSE `endpoint` event
pub const MESSAGES_PATH: &str = "/messages/";

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/mcp", post(post_mcp).delete(delete_mcp))
        .route("/sse", get(open_sse))
        .route(MESSAGES_PATH, post(post_message))
        .route("/messages", post(post_message))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": SERVER_NAME,
    }))
}

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok())
}

fn parse_error(err: serde_json::Error) -> Response {
    let body = JsonRpcResponse::failure(Value::Null, JsonRpcError::parse_error(err));
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

async fn post_mcp(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => return parse_error(e),
    };

    let new_session = if contains_initialize(&message) {
        Some(state.sessions.create())
    } else {
        if let Some(id) = session_header(&headers) {
            if !state.sessions.touch(id) {
                return (StatusCode::NOT_FOUND, "Session not found").into_response();
            }
        }
        None
    };

    match state.dispatcher.handle_message(message).await {
        Some(reply) => {
            let mut response = Json(reply).into_response();
            if let Some(id) = new_session.and_then(|id| HeaderValue::from_str(&id).ok()) {
                response.headers_mut().insert(SESSION_HEADER, id);
            }
            response
        }
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn delete_mcp(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    match session_header(&headers) {
        None => StatusCode::BAD_REQUEST,
        Some(id) if state.sessions.remove(id) => StatusCode::OK,
        Some(_) => StatusCode::NOT_FOUND,
    }
}

async fn open_sse(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (id, rx) = state.sessions.create_sse();
    let guard = SessionGuard::new(state.sessions.clone(), id.clone());

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{MESSAGES_PATH}?session_id={id}"));

    let messages = UnboundedReceiverStream::new(rx).map(move |message| {
        // The session lives exactly as long as this stream.
        let _held = &guard;
        Ok::<_, Infallible>(Event::default().event("message").data(message.to_string()))
    });

    let events = stream::once(async move { Ok::<_, Infallible>(endpoint) }).chain(messages);
    Sse::new(events).keep_alive(KeepAlive::new().interval(state.keepalive))
}

#[derive(Debug, Deserialize)]
struct MessagesQuery {
    session_id: Option<String>,
}

async fn post_message(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
    body: Bytes,
) -> Response {
    let Some(session_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "session_id is required").into_response();
    };
    let Some(sender) = state.sessions.sse_sender(&session_id) else {
        return (StatusCode::NOT_FOUND, "Could not find session").into_response();
    };

    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => return parse_error(e),
    };

    if let Some(reply) = state.dispatcher.handle_message(message).await {
        if sender.send(reply).is_err() {
            tracing::debug!(session = %session_id, "SSE stream closed before reply");
        }
    }
    StatusCode::ACCEPTED.into_response()
}
