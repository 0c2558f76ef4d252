//! HTTP control surface.
//!
//! Lets outside callers run commands, send raw messages and check the
//! session. Spawned as a background task in the gateway, same pattern as the
//! scheduler.

use crate::gateway::{Dispatcher, Trigger};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sidekick_core::{config::ApiConfig, jid::normalize_chat_id, message::OutgoingMessage};
use std::time::Instant;
use tracing::{error, info, warn};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    dispatcher: Dispatcher,
    api_key: Option<String>,
    uptime: Instant,
}

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// `POST /api/command` body.
#[derive(Debug, Deserialize)]
struct CommandRequest {
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    command: Option<String>,
}

/// `POST /api/sendMessage` body.
#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

fn failure(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({"success": false, "error": error.into()})),
    )
}

/// Constant-time string comparison to prevent timing attacks on API token validation.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Check bearer token auth. Returns `None` if authorized, `Some(response)` if rejected.
fn check_auth(headers: &HeaderMap, api_key: &Option<String>) -> Option<(StatusCode, Json<Value>)> {
    let key = api_key.as_ref()?;

    let Some(header) = headers.get("authorization") else {
        return Some(failure(
            StatusCode::UNAUTHORIZED,
            "missing Authorization header",
        ));
    };
    let Ok(value) = header.to_str() else {
        return Some(failure(
            StatusCode::UNAUTHORIZED,
            "invalid Authorization header",
        ));
    };

    match value.strip_prefix("Bearer ") {
        Some(token) if constant_time_eq(token, key) => None,
        _ => Some(failure(StatusCode::UNAUTHORIZED, "invalid token")),
    }
}

/// Trimmed, non-empty field or `None`.
fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `GET /`: liveness text.
async fn root() -> &'static str {
    "Sidekick is running."
}

/// `POST /api/command`: run a command as if `number` had sent it.
async fn command(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: Result<Json<CommandRequest>, JsonRejection>,
) -> ApiResult {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return Err(err);
    }
    let Json(req) = body.map_err(|e| failure(StatusCode::BAD_REQUEST, e.body_text()))?;

    let (Some(number), Some(command)) = (required(&req.number), required(&req.command)) else {
        warn!("api: /api/command rejected: missing fields");
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "number and command are required",
        ));
    };

    let destination = normalize_chat_id(number);
    info!("api: command {command:?} for {destination}");
    state
        .dispatcher
        .dispatch_guarded(
            command.to_string(),
            Trigger::Synthetic {
                destination: destination.clone(),
            },
        )
        .await;

    Ok(Json(json!({"success": true, "destination": destination})))
}

/// `POST /api/sendMessage`: direct send, no command processing.
async fn send_message(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return Err(err);
    }
    let Json(req) = body.map_err(|e| failure(StatusCode::BAD_REQUEST, e.body_text()))?;

    let (Some(number), Some(text)) = (required(&req.number), req.text.as_deref()) else {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "number and text are required",
        ));
    };
    if text.trim().is_empty() {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "number and text are required",
        ));
    }

    let destination = normalize_chat_id(number);
    match state
        .dispatcher
        .transport
        .send(&destination, OutgoingMessage::text(text))
        .await
    {
        Ok(id) => {
            info!("api: sent message {id} to {destination}");
            Ok(Json(json!({"success": true, "messageId": id.0})))
        }
        Err(e) => {
            error!("api: send to {destination} failed: {e}");
            Err(failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// `GET /api/status`: transport connectivity and session identity.
async fn status(headers: HeaderMap, State(state): State<ApiState>) -> ApiResult {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return Err(err);
    }

    match state.dispatcher.transport.status().await {
        Ok(session) => Ok(Json(json!({
            "success": true,
            "transport": state.dispatcher.transport.name(),
            "connected": session.connected,
            "wid": session.wid,
            "pushname": session.pushname,
            "platform": session.platform,
            "uptime_secs": state.uptime.elapsed().as_secs(),
        }))),
        Err(e) => {
            error!("api: status check failed: {e}");
            Err(failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/command", post(command))
        .route("/api/sendMessage", post(send_message))
        .route("/api/status", get(status))
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024)) // 1 MB max request body
        .with_state(state)
}

/// Bind and serve until the task is aborted.
pub async fn serve(config: ApiConfig, dispatcher: Dispatcher, uptime: Instant) {
    let api_key = if config.api_key.is_empty() {
        None
    } else {
        Some(config.api_key.clone())
    };

    let state = ApiState {
        dispatcher,
        api_key,
        uptime,
    };

    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("API server failed to bind to {addr}: {e}");
            return;
        }
    };

    info!("API server listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("API server error: {e}");
    }
}
