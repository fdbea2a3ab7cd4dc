//! Generative UI MCP Server Binary
//!
//! Entry point for the MCP server supporting multiple transports.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use genui_mcp_server::{GenUiMcpServer, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "genui-mcp-server")]
#[command(
    version,
    about = "Generative UI tools (HTML validation, image generation, preview) via Model Context Protocol"
)]
struct Args {
    /// Transport mode: stdio or http
    #[arg(short, long, default_value = "stdio")]
    transport: String,

    /// HTTP server address (only used with http transport)
    #[arg(long, default_value = "127.0.0.1:3000")]
    http_addr: String,

    /// Validation timeout in milliseconds
    #[arg(long, default_value_t = genui_mcp_server::config::DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Directory preview pages are written to (default: <temp>/generative-ui-preview)
    #[arg(long)]
    preview_dir: Option<PathBuf>,

    /// Default port for the preview server
    #[arg(long, default_value_t = genui_mcp_server::config::DEFAULT_PREVIEW_PORT)]
    preview_port: u16,

    /// Gemini model used by generate_image
    #[arg(long, default_value = genui_mcp_server::config::DEFAULT_GEMINI_MODEL)]
    gemini_model: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,
}

impl Args {
    fn config(&self) -> ServerConfig {
        let mut config = ServerConfig::without_env()
            .with_timeout(self.timeout_ms)
            .with_preview_port(self.preview_port)
            .with_gemini_model(self.gemini_model.clone())
            .with_gemini_api_key(self.gemini_api_key.clone());
        if let Some(dir) = &self.preview_dir {
            config = config.with_preview_dir(dir.clone());
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout belongs to the protocol on the stdio transport, so logs always go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Generative UI MCP Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Transport: {}", args.transport);

    let server = Arc::new(GenUiMcpServer::new(args.config()));
    if !server.images().has_api_key() {
        tracing::warn!("GEMINI_API_KEY is not set; generate_image will report failures");
    }

    match args.transport.as_str() {
        "stdio" => {
            genui_mcp_server::transport::stdio::run_stdio_server(server)
                .await
                .context("stdio transport failed")?;
        }
        #[cfg(feature = "http")]
        "http" => {
            genui_mcp_server::transport::http::run_http_server(&args.http_addr, server)
                .await
                .with_context(|| format!("HTTP transport on {} failed", args.http_addr))?;
        }
        #[cfg(not(feature = "http"))]
        "http" => bail!("HTTP transport not enabled. Rebuild with --features http"),
        other => bail!("Unknown transport: {}. Use 'stdio' or 'http'", other),
    }

    Ok(())
}
