//! Standard I/O transport for MCP
//!
//! Accepts both `Content-Length` framed messages and newline-delimited JSON
//! and answers each request in the framing it arrived in.
//!
//! IMPORTANT: All logging MUST go to stderr. stdout is reserved for
//! JSON-RPC protocol messages only.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::errors::ServerError;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::mcp::GenUiMcpServer;

/// Largest `Content-Length` body accepted
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

/// How a message was framed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    ContentLength,
    Line,
}

/// Run the MCP server using stdio transport
pub async fn run_stdio_server(server: Arc<GenUiMcpServer>) -> Result<(), ServerError> {
    info!("Starting stdio transport");

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut writer = tokio::io::stdout();

    serve(&server, &mut reader, &mut writer).await;

    server.shutdown().await;
    Ok(())
}

/// Request/response loop over any reader/writer pair, until EOF
pub async fn serve<R, W>(server: &GenUiMcpServer, reader: &mut R, writer: &mut W)
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let (body, framing) = match read_message(reader).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                info!("EOF reached, shutting down");
                break;
            }
            Err(ServerError::IoError(e)) => {
                error!("Failed to read from stdin: {}", e);
                break;
            }
            Err(e) => {
                warn!("Failed to read message: {}", e);
                continue;
            }
        };

        let response = match serde_json::from_slice::<JsonRpcRequest>(&body) {
            Ok(request) if request.is_notification() => {
                debug!(method = %request.method, "Notification received");
                continue;
            }
            Ok(request) => server.handle_request(request).await,
            Err(e) => JsonRpcResponse::error(None, -32700, format!("Parse error: {}", e)),
        };

        if let Err(e) = write_message(writer, &response, framing).await {
            error!("Failed to write response: {}", e);
        }
    }
}

/// Read one message body from the input stream
pub async fn read_message<R>(reader: &mut R) -> Result<Option<(Vec<u8>, Framing)>, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            break;
        }
    }

    let first = line.trim();
    if first.starts_with('{') {
        return Ok(Some((first.as_bytes().to_vec(), Framing::Line)));
    }

    let content_length = content_length(first).ok_or_else(|| {
        ServerError::ProtocolError(format!("Expected Content-Length header, got: {}", first))
    })??;
    if content_length > MAX_MESSAGE_BYTES {
        return Err(ServerError::ProtocolError(format!(
            "Content-Length {} exceeds the {} byte limit",
            content_length, MAX_MESSAGE_BYTES
        )));
    }

    // Skip any further headers up to the blank separator line
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Err(ServerError::ProtocolError("EOF inside message headers".to_string()));
        }
        if line.trim().is_empty() {
            break;
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;
    Ok(Some((body, Framing::ContentLength)))
}

fn content_length(header: &str) -> Option<Result<usize, ServerError>> {
    let (name, value) = header.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    Some(
        value
            .trim()
            .parse()
            .map_err(|_| ServerError::ProtocolError("Invalid Content-Length".to_string())),
    )
}

/// Write a JSON-RPC message to the output stream
pub async fn write_message<W>(
    writer: &mut W,
    response: &JsonRpcResponse,
    framing: Framing,
) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_string(response)?;

    match framing {
        Framing::ContentLength => {
            let header = format!("Content-Length: {}\r\n\r\n", body.len());
            writer.write_all(header.as_bytes()).await?;
            writer.write_all(body.as_bytes()).await?;
        }
        Framing::Line => {
            writer.write_all(body.as_bytes()).await?;
            writer.write_all(b"\n").await?;
        }
    }
    writer.flush().await?;

    Ok(())
}
