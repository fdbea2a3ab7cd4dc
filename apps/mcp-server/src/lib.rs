//! Generative UI MCP Server
//!
//! A Model Context Protocol server that helps agents build interactive HTML
//! applications: it validates and repairs generated pages, generates images
//! with Gemini and serves pages locally for preview.

pub mod config;
pub mod errors;
pub mod imagegen;
pub mod mcp;
pub mod preview;
pub mod transport;

pub use config::ServerConfig;
pub use errors::ServerError;
pub use mcp::server::GenUiMcpServer;

// Re-export the validation core
pub use html_validator::{validate_html, HtmlValidator, Issue, IssueKind, ValidationResult};
