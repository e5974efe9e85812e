use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use crate::cache::TokenCache;
use crate::config::settings::ServerSettings;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<TokenCache>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(cache: Arc<TokenCache>) -> Self {
        Self {
            cache,
            started_at: Utc::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/token", get(token))
        .route("/update", get(update))
        .route("/", get(index))
        .fallback(not_found)
        .with_state(state)
}

/// Serve credentials from the cache, refreshing first if none are cached or
/// the cached pair went stale.
async fn token(State(state): State<AppState>) -> impl IntoResponse {
    match state.cache.get(false).await {
        Ok(credentials) => {
            let status = state.cache.status().await;
            (
                StatusCode::OK,
                Json(json!({
                    "sessionId": credentials.session_id,
                    "proof": credentials.proof,
                    "updated": status.last_updated,
                })),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

/// Force a refresh and acknowledge it; the credentials themselves are served
/// by `/token`. Joins an already-running refresh instead of starting a second.
async fn update(State(state): State<AppState>) -> impl IntoResponse {
    let joined = state.cache.status().await.refreshing;
    match state.cache.get(true).await {
        Ok(_) => {
            let status = state.cache.status().await;
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "joinedInFlight": joined,
                    "updated": status.last_updated,
                })),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.cache.status().await;
    let interval = state.cache.refresh_interval();

    let last_updated = status
        .last_updated
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    let state_line = if status.refreshing { "generating" } else { "idle" };
    let next_refresh_secs = status
        .last_updated
        .map(|t| {
            let next = t + chrono::Duration::from_std(interval).unwrap_or_default();
            (next - Utc::now()).num_seconds().max(0)
        })
        .unwrap_or(0);
    let uptime_secs = (Utc::now() - state.started_at).num_seconds();

    Html(format!(
        "<html><body><h1>proof-agent</h1>\
         <p>state: {state_line}</p>\
         <p>last update: {last_updated}</p>\
         <p>refreshes: {}</p>\
         <p>next auto-refresh in: {next_refresh_secs}s</p>\
         <p>uptime: {uptime_secs}s</p>\
         </body></html>",
        status.refresh_count
    ))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

/// Bind and serve until `shutdown` resolves.
pub async fn start(
    settings: &ServerSettings,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = router(state);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", settings.host, settings.port)).await?;
    info!(host = %settings.host, port = settings.port, "http server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
