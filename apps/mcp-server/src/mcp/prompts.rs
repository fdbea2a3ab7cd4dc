//! MCP Prompt definitions

use std::collections::HashMap;

use super::protocol::{Prompt, PromptArgument, PromptContent, PromptMessage};
use crate::errors::ServerError;

/// System prompt for generating interactive HTML applications
pub const GENERATIVE_UI_SYSTEM_PROMPT: &str = include_str!("../../prompts/generative_ui.md");

/// Get all prompt definitions
pub fn get_prompt_definitions() -> Vec<Prompt> {
    vec![Prompt {
        name: "generative_ui".to_string(),
        description: Some(
            "System prompt for generating complete, interactive HTML applications".to_string(),
        ),
        arguments: Some(vec![PromptArgument {
            name: "request".to_string(),
            description: Some("What the user wants built".to_string()),
            required: Some(false),
        }]),
    }]
}

/// Get a prompt by name with arguments
pub fn get_prompt(
    name: &str,
    arguments: HashMap<String, String>,
) -> Result<Vec<PromptMessage>, ServerError> {
    match name {
        "generative_ui" => Ok(expand_generative_ui_prompt(arguments)),
        _ => Err(ServerError::PromptNotFound(name.to_string())),
    }
}

fn expand_generative_ui_prompt(args: HashMap<String, String>) -> Vec<PromptMessage> {
    let mut text = GENERATIVE_UI_SYSTEM_PROMPT.trim_end().to_string();

    if let Some(request) = args.get("request").map(|r| r.trim()).filter(|r| !r.is_empty()) {
        text.push_str("\n\n---\n\nUser request: ");
        text.push_str(request);
    }

    vec![PromptMessage {
        role: "user".to_string(),
        content: PromptContent::Text { text },
    }]
}
