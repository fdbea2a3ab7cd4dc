//! MCP Server core implementation
//!
//! Both transports hand parsed requests to [`GenUiMcpServer::handle_request`].

use std::collections::HashMap;
use std::time::Duration;

use html_validator::{validate_html, ValidationResult};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::protocol::*;
use super::{prompts, resources, tools};
use crate::config::ServerConfig;
use crate::errors::ServerError;
use crate::imagegen::GeminiClient;
use crate::preview::{PreviewPage, PreviewServer};

/// The Generative UI MCP server
#[derive(Debug)]
pub struct GenUiMcpServer {
    name: String,
    version: String,
    config: ServerConfig,
    images: GeminiClient,
    preview: Mutex<PreviewServer>,
}

impl GenUiMcpServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            name: "genui-mcp-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            images: GeminiClient::new(&config),
            preview: Mutex::new(PreviewServer::new(config.preview_dir.clone())),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Validation time budget
    pub fn timeout_ms(&self) -> u64 {
        self.config.timeout_ms
    }

    pub fn images(&self) -> &GeminiClient {
        &self.images
    }

    /// Run the pipeline off the async runtime, bounded by the configured timeout
    pub async fn validate(&self, html: String, fix: bool) -> Result<ValidationResult, ServerError> {
        let timeout_ms = self.timeout_ms();
        let task = tokio::task::spawn_blocking(move || validate_html(&html, fix));

        match tokio::time::timeout(Duration::from_millis(timeout_ms), task).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(ServerError::ValidationFailed(e.to_string())),
            Err(_) => Err(ServerError::Timeout(timeout_ms)),
        }
    }

    /// Write a page into the preview directory and serve it.
    ///
    /// Without an explicit port the running listener is reused, or the
    /// configured default port is used.
    pub async fn publish_preview(
        &self,
        html: &str,
        filename: &str,
        port: Option<u16>,
    ) -> Result<PreviewPage, ServerError> {
        let mut preview = self.preview.lock().await;
        let port = port
            .or_else(|| preview.port())
            .unwrap_or(self.config.preview_port);
        preview.publish(html, filename, port).await
    }

    /// Port of the running preview listener, if any
    pub async fn preview_port(&self) -> Option<u16> {
        self.preview.lock().await.port()
    }

    /// Release owned resources (the preview listener)
    pub async fn shutdown(&self) {
        self.preview.lock().await.shutdown().await;
    }

    /// Dispatch one JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        debug!(method = %request.method, "Handling request");

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" | "notifications/initialized" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            "resources/list" => handle_list_resources(id),
            "resources/read" => handle_read_resource(id, request.params),
            "prompts/list" => handle_list_prompts(id),
            "prompts/get" => handle_get_prompt(id, request.params),
            "ping" => JsonRpcResponse::success(id, json!({})),
            _ => JsonRpcResponse::error(id, -32601, format!("Method not found: {}", request.method)),
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                resources: Some(ResourcesCapability {
                    subscribe: Some(false),
                    list_changed: Some(false),
                }),
                prompts: Some(PromptsCapability {
                    list_changed: Some(false),
                }),
            },
            server_info: ServerInfo {
                name: self.name.clone(),
                version: self.version.clone(),
            },
        };

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, -32603, e.to_string()),
        }
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        info!(tool = name, "Tool call");

        match tools::handle_tool_call(self, name, arguments).await {
            Ok(content) => JsonRpcResponse::success(
                id,
                json!({
                    "content": content,
                    "isError": false
                }),
            ),
            Err(e) => {
                info!(tool = name, error = %e, "Tool call failed");
                JsonRpcResponse::success(
                    id,
                    json!({
                        "content": [{"type": "text", "text": e.tool_message()}],
                        "isError": true
                    }),
                )
            }
        }
    }
}

impl Default for GenUiMcpServer {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

fn handle_list_tools(id: Option<Value>) -> JsonRpcResponse {
    let tools = tools::get_tool_definitions();
    JsonRpcResponse::success(id, json!({ "tools": tools }))
}

fn handle_list_resources(id: Option<Value>) -> JsonRpcResponse {
    let resources = resources::get_resource_definitions();
    JsonRpcResponse::success(id, json!({ "resources": resources }))
}

fn handle_read_resource(id: Option<Value>, params: Value) -> JsonRpcResponse {
    let uri = params.get("uri").and_then(|v| v.as_str()).unwrap_or("");

    match resources::read_resource(uri) {
        Ok(content) => JsonRpcResponse::success(id, json!({ "contents": [content] })),
        Err(e) => JsonRpcResponse::error(id, e.rpc_code(), e.to_string()),
    }
}

fn handle_list_prompts(id: Option<Value>) -> JsonRpcResponse {
    let prompts = prompts::get_prompt_definitions();
    JsonRpcResponse::success(id, json!({ "prompts": prompts }))
}

fn handle_get_prompt(id: Option<Value>, params: Value) -> JsonRpcResponse {
    let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");

    let arguments: HashMap<String, String> = params
        .get("arguments")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    match prompts::get_prompt(name, arguments) {
        Ok(messages) => JsonRpcResponse::success(id, json!({ "messages": messages })),
        Err(e) => JsonRpcResponse::error(id, e.rpc_code(), e.to_string()),
    }
}
