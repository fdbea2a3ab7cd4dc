//! HTTP/SSE transport for MCP
//!
//! JSON-RPC over `POST /mcp`, with every response also pushed to `/sse`
//! subscribers, plus a small REST surface for web clients.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{sse::Event, IntoResponse, Response, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream};
use html_validator::Issue;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::errors::ServerError;
use crate::mcp::protocol::JsonRpcRequest;
use crate::mcp::GenUiMcpServer;

/// REST API request for validation
#[derive(Debug, Deserialize)]
pub struct ValidateApiRequest {
    pub html_content: String,
    #[serde(default = "default_fix_errors")]
    pub fix_errors: bool,
}

fn default_fix_errors() -> bool {
    true
}

/// REST API response for validation
#[derive(Debug, Serialize)]
pub struct ValidateApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<Issue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Shared state for the HTTP server
#[derive(Clone)]
pub struct HttpServerState {
    /// The MCP server instance
    server: Arc<GenUiMcpServer>,
    /// Broadcast channel for SSE notifications
    sse_tx: broadcast::Sender<String>,
}

impl HttpServerState {
    pub fn new(server: Arc<GenUiMcpServer>) -> Self {
        let (sse_tx, _) = broadcast::channel::<String>(100);
        Self { server, sse_tx }
    }
}

/// Build the router
pub fn router(state: HttpServerState) -> Router {
    // Configure CORS for browser clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // MCP JSON-RPC endpoint
        .route("/mcp", post(handle_mcp_request))
        // SSE endpoint for streaming notifications
        .route("/sse", get(handle_sse))
        // REST API for web clients
        .route("/api/validate", post(handle_api_validate))
        .route("/health", get(handle_health))
        .route("/", get(handle_info))
        .layer(cors)
        .with_state(state)
}

/// Run the MCP server using HTTP transport until Ctrl-C
pub async fn run_http_server(addr: &str, server: Arc<GenUiMcpServer>) -> Result<(), ServerError> {
    info!("Starting HTTP transport on {}", addr);

    let app = router(HttpServerState::new(server.clone()));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    server.shutdown().await;
    Ok(())
}

/// Handle MCP JSON-RPC requests
async fn handle_mcp_request(
    State(state): State<HttpServerState>,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    debug!("HTTP request: {:?}", request.method);

    if request.is_notification() {
        return StatusCode::ACCEPTED.into_response();
    }

    let response = state.server.handle_request(request).await;

    if let Ok(text) = serde_json::to_string(&response) {
        // No subscribers is fine
        let _ = state.sse_tx.send(text);
    }

    Json(response).into_response()
}

/// Handle SSE connections for streaming notifications
async fn handle_sse(
    State(state): State<HttpServerState>,
) -> Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>> {
    let rx = state.sse_tx.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(msg) => return Some((Ok(Event::default().data(msg)), rx)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "SSE subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream)
}

/// POST /api/validate - Validate (and optionally fix) an HTML document
async fn handle_api_validate(
    State(state): State<HttpServerState>,
    Json(request): Json<ValidateApiRequest>,
) -> impl IntoResponse {
    match state
        .server
        .validate(request.html_content, request.fix_errors)
        .await
    {
        Ok(result) => {
            let report = result.to_text();
            Json(ValidateApiResponse {
                success: true,
                html: Some(result.html),
                issues: Some(result.issues),
                warnings: Some(result.warnings),
                report: Some(report),
                error: None,
            })
        }
        Err(e) => Json(ValidateApiResponse {
            success: false,
            html: None,
            issues: None,
            warnings: None,
            report: None,
            error: Some(e.to_string()),
        }),
    }
}

/// Health check endpoint
async fn handle_health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "genui-mcp-server"
    }))
}

/// Server info endpoint
async fn handle_info(State(state): State<HttpServerState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "http",
        "timeout_ms": state.server.timeout_ms(),
        "endpoints": {
            "mcp": "/mcp",
            "sse": "/sse",
            "api_validate": "/api/validate",
            "health": "/health"
        }
    }))
}
