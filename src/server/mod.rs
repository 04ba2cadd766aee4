//! HTTP server
//!
//! Exposes the two operational entry points:
//! - `POST /poll` - trigger one polling cycle, authenticated with basic credentials
//! - `POST /webhook` - receive board change events, authenticated with the
//!   HMAC signature scheme
//!
//! # Routes
//!
//! - `GET /health` - Liveness check
//! - `POST /poll` - Run one polling cycle (basic auth)
//! - `POST /webhook` - Handle a board change event (signature auth)
//! - `HEAD /webhook` - Webhook registration handshake
//!
//! Response codes: 200 on success, 401 on authentication failure, 400 on
//! malformed input, 405 on wrong verb, 202 for well-formed events that are not
//! archive transitions, 500 on internal failure.

use crate::board::{Board, HttpBoard};
use crate::config::Config;
use crate::notify::{notify, HttpTransport, NotificationTransport};
use crate::sync::{http_sources, run_cycle};
use crate::webhook::{verify_signature, WebhookEvent};
use crate::{BoardSyncError, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Header carrying the webhook HMAC signature
const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Shared server state
struct AppState {
    config: Config,
    board: Arc<dyn Board>,
    transport: Arc<dyn NotificationTransport>,
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// HTTP server for boardsync
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a server with HTTP collaborators built from the configuration
    pub fn new(config: Config) -> Result<Self> {
        let board = Arc::new(HttpBoard::new(&config.board)?);
        let transport = Arc::new(HttpTransport::new()?);
        Ok(Self::with_collaborators(config, board, transport))
    }

    /// Create a server with explicit collaborators (used by tests)
    pub fn with_collaborators(
        config: Config,
        board: Arc<dyn Board>,
        transport: Arc<dyn NotificationTransport>,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                config,
                board,
                transport,
            }),
        }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/poll", post(trigger_poll))
            .route("/webhook", post(receive_webhook).head(webhook_handshake))
            .with_state(self.state.clone())
    }

    /// Run the server until the process is terminated
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.state.config.server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| BoardSyncError::Other(format!("could not bind {}: {}", addr, e)))?;

        tracing::info!(addr = %addr, "boardsync server listening");

        let router = self.router();
        axum::serve(listener, router)
            .await
            .map_err(BoardSyncError::Io)
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Check basic auth credentials against the server configuration
fn check_basic_auth(headers: &HeaderMap, username: &str, password: &str) -> bool {
    let value = match headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        Some(v) => v,
        None => return false,
    };

    let encoded = match value.strip_prefix("Basic ") {
        Some(e) => e,
        None => return false,
    };

    let decoded = match BASE64.decode(encoded) {
        Ok(d) => d,
        Err(_) => return false,
    };

    let credentials = match String::from_utf8(decoded) {
        Ok(c) => c,
        Err(_) => return false,
    };

    match credentials.split_once(':') {
        Some((user, pass)) => user == username && pass == password,
        None => false,
    }
}

/// `POST /poll` - run one polling cycle now
async fn trigger_poll(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> axum::response::Response {
    let server_config = &state.config.server;
    if !check_basic_auth(&headers, &server_config.username, &server_config.password) {
        tracing::warn!("poll trigger rejected: bad credentials");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "invalid credentials".into(),
            }),
        )
            .into_response();
    }

    let sources = match http_sources(&state.config) {
        Ok(sources) => sources,
        Err(e) => {
            tracing::error!(error = %e, "could not build source adapters");
            return internal_error(e);
        }
    };

    let timezone = match state.config.timezone() {
        Ok(tz) => tz,
        Err(e) => {
            tracing::error!(error = %e, "invalid timezone configuration");
            return internal_error(e);
        }
    };

    let now = Utc::now().with_timezone(&timezone);
    match run_cycle(&state.config, state.board.clone(), sources, now).await {
        Ok(report) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "sources_polled": report.sources_polled,
                "created": report.created,
                "removed": report.removed,
                "errors": report.errors,
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "polling cycle failed");
            internal_error(e)
        }
    }
}

/// `HEAD /webhook` - the board validates the callback URL with a HEAD request
/// when the webhook is registered
async fn webhook_handshake() -> StatusCode {
    StatusCode::OK
}

/// `POST /webhook` - verify, parse, and fan out a board change event
async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    let webhook_config = &state.config.board.webhook;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !verify_signature(
        &webhook_config.callback_url,
        &webhook_config.secret,
        signature,
        &body,
    ) {
        tracing::warn!("webhook rejected: invalid signature");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "invalid signature".into(),
            }),
        )
            .into_response();
    }

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "malformed webhook body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("malformed event body: {}", e),
                }),
            )
                .into_response();
        }
    };

    let item_id = match event.archived_item_id() {
        Some(id) => id,
        None => {
            // well-formed, just not an archive transition
            return (
                StatusCode::ACCEPTED,
                Json(serde_json::json!({ "status": "ignored" })),
            )
                .into_response();
        }
    };

    let item = match state.board.get(item_id).await {
        Ok(item) => item,
        Err(e) => {
            tracing::error!(item_id = %item_id, error = %e, "could not fetch archived item");
            return internal_error(e);
        }
    };

    let matching = state
        .config
        .services
        .iter()
        .filter(|s| item.labels.contains(&s.label))
        .count();

    let errors = notify(&item, &state.config.services, state.transport.as_ref()).await;
    for error in &errors {
        tracing::error!(error = %error, "notification delivery failed");
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "delivered": matching.saturating_sub(errors.len()),
            "failed": errors.len(),
        })),
    )
        .into_response()
}

fn internal_error(e: BoardSyncError) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_basic_auth() {
        let mut headers = HeaderMap::new();
        assert!(!check_basic_auth(&headers, "user", "pass"));

        let encoded = BASE64.encode("user:pass");
        headers.insert(
            header::AUTHORIZATION,
            format!("Basic {}", encoded).parse().unwrap(),
        );
        assert!(check_basic_auth(&headers, "user", "pass"));
        assert!(!check_basic_auth(&headers, "user", "other"));
        assert!(!check_basic_auth(&headers, "other", "pass"));
    }

    #[test]
    fn test_check_basic_auth_rejects_malformed_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer token".parse().unwrap());
        assert!(!check_basic_auth(&headers, "user", "pass"));

        headers.insert(header::AUTHORIZATION, "Basic !!!notb64".parse().unwrap());
        assert!(!check_basic_auth(&headers, "user", "pass"));

        let encoded = BASE64.encode("no-colon-here");
        headers.insert(
            header::AUTHORIZATION,
            format!("Basic {}", encoded).parse().unwrap(),
        );
        assert!(!check_basic_auth(&headers, "user", "pass"));
    }
}
