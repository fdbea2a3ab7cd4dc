//! Error types for server operations

use thiserror::Error;

/// Server-side errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Validation timeout after {0}ms")]
    Timeout(u64),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to serve HTML: {0}")]
    PreviewError(String),

    #[error("Failed to generate image: {0}")]
    ImageGeneration(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ServerError {
    /// JSON-RPC error code used when this error is reported at the protocol level
    pub fn rpc_code(&self) -> i32 {
        match self {
            ServerError::ProtocolError(_) | ServerError::JsonError(_) => -32700,
            ServerError::ResourceNotFound(_)
            | ServerError::PromptNotFound(_)
            | ServerError::InvalidArgument(_) => -32602,
            _ => -32603,
        }
    }

    /// Text of the `isError` tool result. Preview and image failures already
    /// read as a sentence and are not prefixed again.
    pub fn tool_message(&self) -> String {
        match self {
            ServerError::PreviewError(_) | ServerError::ImageGeneration(_) => self.to_string(),
            _ => format!("Error: {}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ServerError::UnknownTool("nope".into()).to_string(),
            "Unknown tool: nope"
        );
        assert_eq!(
            ServerError::Timeout(250).to_string(),
            "Validation timeout after 250ms"
        );
        assert_eq!(
            ServerError::ImageGeneration("No parts in response".into()).to_string(),
            "Failed to generate image: No parts in response"
        );
    }

    #[test]
    fn test_rpc_codes() {
        assert_eq!(ServerError::PromptNotFound("x".into()).rpc_code(), -32602);
        assert_eq!(ServerError::ProtocolError("x".into()).rpc_code(), -32700);
        assert_eq!(ServerError::Timeout(1).rpc_code(), -32603);
    }

    #[test]
    fn test_tool_messages_are_prefixed_once() {
        assert_eq!(
            ServerError::ImageGeneration("No candidates returned from Gemini".into())
                .tool_message(),
            "Failed to generate image: No candidates returned from Gemini"
        );
        assert_eq!(
            ServerError::PreviewError("address in use".into()).tool_message(),
            "Failed to serve HTML: address in use"
        );
        assert_eq!(
            ServerError::UnknownTool("render_pdf".into()).tool_message(),
            "Error: Unknown tool: render_pdf"
        );
    }
}
