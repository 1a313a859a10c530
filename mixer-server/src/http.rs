//! zyndmixer HTTP API
//!
//! Axum-based HTTP server exposing the agent relays.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a pure
//! inner function. The inner functions are directly testable without axum dispatch
//! machinery.
//!
//! Endpoints:
//! - GET  /health     : health check
//! - GET  /version    : server version info
//! - POST /api/deploy : create, patch and activate an agent workflow
//! - POST /api/chat   : relay a prompt to a deployed agent's webhook
//! - GET  /api/agent  : look up a workflow and its webhook URL

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use mixer_core::{MixerConfig, MixerError, WorkflowPlatform};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::subsystems::{deploy, invoke, lookup};

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub config: MixerConfig,
    pub platform: Arc<dyn WorkflowPlatform>,
    /// Client for agent webhook calls. No timeout: agent runs can be slow.
    pub relay: reqwest::Client,
}

impl HttpState {
    pub fn new(config: MixerConfig, platform: Arc<dyn WorkflowPlatform>) -> Self {
        Self {
            config,
            platform,
            relay: reqwest::Client::new(),
        }
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/api/deploy", post(deploy_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/agent", get(agent_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    config: MixerConfig,
    platform: Arc<dyn WorkflowPlatform>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState::new(config, platform));

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("zyndmixer HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub name: Option<String>,
    pub social_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub webhook_url: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentQuery {
    pub workflow_id: Option<String>,
}

/// Standard HTTP error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&MixerError> for ErrorResponse {
    fn from(e: &MixerError) -> Self {
        Self {
            error: e.summary(),
            details: e.details(),
        }
    }
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner health check (pure, no IO).
pub fn health_inner(config: &MixerConfig) -> (StatusCode, serde_json::Value) {
    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "platform": config.platform.base_url,
        }),
    )
}

/// Inner version: returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "zyndmixer/1",
    })
}

/// Inner deploy: runs the deployment orchestrator.
pub async fn deploy_inner(state: &HttpState, req: DeployRequest) -> (StatusCode, serde_json::Value) {
    let result = deploy::deploy_agent(
        state.platform.as_ref(),
        &state.config.template,
        req.name.as_deref().unwrap_or_default(),
        req.social_url.as_deref(),
        req.description.as_deref().unwrap_or_default(),
    )
    .await;

    match result.and_then(|record| Ok(serde_json::to_value(record)?)) {
        Ok(mut body) => {
            if let Some(obj) = body.as_object_mut() {
                obj.insert("success".to_string(), serde_json::json!(true));
            }
            (StatusCode::OK, body)
        }
        Err(e) => error_to_http(&e),
    }
}

/// Inner chat: relays the prompt and returns the agent's JSON as-is.
pub async fn chat_inner(state: &HttpState, req: ChatRequest) -> (StatusCode, serde_json::Value) {
    let result = invoke::invoke_agent(
        &state.relay,
        req.webhook_url.as_deref().unwrap_or_default(),
        req.prompt.as_deref().unwrap_or_default(),
    )
    .await;

    match result {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => error_to_http(&e),
    }
}

/// Inner agent lookup.
pub async fn agent_inner(state: &HttpState, query: AgentQuery) -> (StatusCode, serde_json::Value) {
    let result = lookup::lookup_agent(
        state.platform.as_ref(),
        query.workflow_id.as_deref().unwrap_or_default(),
    )
    .await;

    match result.and_then(|summary| Ok(serde_json::to_value(summary)?)) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => error_to_http(&e),
    }
}

// ============================================================================
// Axum handler wrappers (thin: delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.config);
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn deploy_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<DeployRequest>,
) -> impl IntoResponse {
    let (status, body) = deploy_inner(&state, req).await;
    (status, Json(body))
}

pub async fn chat_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let (status, body) = chat_inner(&state, req).await;
    (status, Json(body))
}

pub async fn agent_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<AgentQuery>,
) -> impl IntoResponse {
    let (status, body) = agent_inner(&state, query).await;
    (status, Json(body))
}

// ============================================================================
// Helpers
// ============================================================================

/// Convert a `MixerError` into an HTTP status and `{error, details}` body.
pub fn error_to_http(e: &MixerError) -> (StatusCode, serde_json::Value) {
    let status =
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), error = %e, "Request failed");
    }
    let body = serde_json::to_value(ErrorResponse::from(e))
        .unwrap_or_else(|_| serde_json::json!({ "error": e.summary() }));
    (status, body)
}

// ============================================================================
// Unit Tests: call inner functions directly
// ============================================================================
