//! MCP transports

#[cfg(feature = "http")]
pub mod http;
pub mod stdio;
