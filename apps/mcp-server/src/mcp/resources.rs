//! MCP Resource providers

use html_validator::passes::PIPELINE;
use serde_json::json;

use super::prompts::GENERATIVE_UI_SYSTEM_PROMPT;
use super::protocol::{Resource, ResourceContent};
use crate::errors::ServerError;

pub const SYSTEM_PROMPT_URI: &str = "genui://prompts/system";
pub const VALIDATORS_URI: &str = "genui://validators";

/// Get all resource definitions
pub fn get_resource_definitions() -> Vec<Resource> {
    vec![
        Resource {
            uri: SYSTEM_PROMPT_URI.to_string(),
            name: "Generative UI System Prompt".to_string(),
            description: Some(
                "Instructions for generating complete, interactive HTML applications".to_string(),
            ),
            mime_type: Some("text/markdown".to_string()),
        },
        Resource {
            uri: VALIDATORS_URI.to_string(),
            name: "HTML Validators".to_string(),
            description: Some("The post-processing passes run by validate_html, in order".to_string()),
            mime_type: Some("application/json".to_string()),
        },
    ]
}

/// Read a resource by URI
pub fn read_resource(uri: &str) -> Result<ResourceContent, ServerError> {
    match uri {
        SYSTEM_PROMPT_URI => Ok(ResourceContent {
            uri: uri.to_string(),
            mime_type: Some("text/markdown".to_string()),
            text: Some(GENERATIVE_UI_SYSTEM_PROMPT.to_string()),
            blob: None,
        }),
        VALIDATORS_URI => {
            let passes: Vec<_> = PIPELINE
                .iter()
                .map(|kind| {
                    json!({
                        "position": kind.position(),
                        "kind": kind.as_str(),
                        "summary": kind.summary()
                    })
                })
                .collect();

            Ok(ResourceContent {
                uri: uri.to_string(),
                mime_type: Some("application/json".to_string()),
                text: Some(serde_json::to_string_pretty(&passes)?),
                blob: None,
            })
        }
        _ => Err(ServerError::ResourceNotFound(uri.to_string())),
    }
}
