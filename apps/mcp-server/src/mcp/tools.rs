//! MCP Tool definitions and handlers

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::protocol::{Tool, ToolResultContent};
use super::server::GenUiMcpServer;
use crate::errors::ServerError;
use crate::imagegen::{AspectRatio, GenerateImageResult};

const VALIDATE_HTML_DESCRIPTION: &str = "Validate and fix common issues in generated HTML. Runs nine post-processors in order:

1. API Key Detection - Warns about placeholder API keys
2. Error Detection - Injects error reporting JavaScript
3. JavaScript Fixes - Fixes common JS parsing issues
4. CSS/Tailwind Fixes - Ensures Tailwind CDN is included
5. Circular Dependencies - Detects problematic sizing patterns
6. HTML Escaping - Fixes unescaped characters in attributes
7. Citation Removal - Removes citation markers from JS code
8. API Issue Fixes - Warns about API configuration issues
9. Asset Fixes - Detects hallucinated asset URLs, adds icon CDNs

Use this tool BEFORE serve_html to catch and fix common problems in generated HTML.";

const GENERATE_IMAGE_DESCRIPTION: &str = "Generate an image with Gemini for embedding in Generative UI HTML.

**When to use this tool:**
- Generic concepts and creative illustrations (e.g., \"a happy dog\", \"futuristic city\")
- Famous, globally recognized landmarks (e.g., \"Eiffel Tower\")
- Abstract images, backgrounds, and decorative elements
- Characters and scenes for stories (include full character descriptions every time)
- Icons and UI elements (simple graphics work best)

**When to use web search instead:**
- Specific named people
- Non-famous specific places
- When real photographs are required
- Current events or recent images

**How to use the returned data URL:**
The tool returns a base64 data URL. Embed it directly in your HTML:
`<img src=\"data:image/png;base64,...\" alt=\"description\" class=\"w-full h-auto\" />`

**Tips:**
- Be specific about style, colors, background, and visual elements
- For stories/comics: repeat the character descriptions in EVERY prompt
- The image generator doesn't know context, so describe everything needed
- Avoid complex schematics, graphs, or lengthy text
- All images are opaque (no transparent backgrounds)";

const SERVE_HTML_DESCRIPTION: &str = "Save HTML content to a file and serve it locally for preview in a browser.

This tool:
1. Saves the HTML to a temp file
2. Starts a local HTTP server (if not already running)
3. Returns a localhost URL you can open in a browser

Useful for previewing generated Generative UI output before saving or sharing.";

/// Get all tool definitions
pub fn get_tool_definitions() -> Vec<Tool> {
    let ratios: Vec<&str> = AspectRatio::ALL.iter().map(|r| r.as_str()).collect();

    vec![
        Tool {
            name: "validate_html".to_string(),
            description: Some(VALIDATE_HTML_DESCRIPTION.to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "html_content": {
                        "type": "string",
                        "description": "The HTML content to validate and optionally fix"
                    },
                    "fix_errors": {
                        "type": "boolean",
                        "description": "Whether to auto-fix issues where possible (default: true)",
                        "default": true
                    }
                },
                "required": ["html_content"]
            }),
        },
        Tool {
            name: "generate_image".to_string(),
            description: Some(GENERATE_IMAGE_DESCRIPTION.to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "Detailed description of the image to generate. Include style, colors, mood, and all relevant details."
                    },
                    "aspect_ratio": {
                        "type": "string",
                        "enum": ratios,
                        "description": "Aspect ratio for the generated image. Default is 1:1.",
                        "default": "1:1"
                    }
                },
                "required": ["prompt"]
            }),
        },
        Tool {
            name: "serve_html".to_string(),
            description: Some(SERVE_HTML_DESCRIPTION.to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "html_content": {
                        "type": "string",
                        "description": "The complete HTML content to serve (should be a full HTML document starting with <!DOCTYPE html>)"
                    },
                    "filename": {
                        "type": "string",
                        "description": "Optional filename (without extension). Default is 'preview'.",
                        "default": "preview"
                    },
                    "port": {
                        "type": "integer",
                        "description": "Port to serve on. Defaults to the running preview server's port, or 3333.",
                        "minimum": 0,
                        "maximum": 65535
                    }
                },
                "required": ["html_content"]
            }),
        },
    ]
}

fn default_true() -> bool {
    true
}

fn default_filename() -> String {
    "preview".to_string()
}

#[derive(Debug, Deserialize)]
struct ValidateHtmlArgs {
    html_content: String,
    #[serde(default = "default_true")]
    fix_errors: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateImageArgs {
    prompt: String,
    #[serde(default)]
    aspect_ratio: AspectRatio,
}

#[derive(Debug, Deserialize)]
struct ServeHtmlArgs {
    html_content: String,
    #[serde(default = "default_filename")]
    filename: String,
    #[serde(default)]
    port: Option<u16>,
}

fn parse_args<T: DeserializeOwned>(arguments: serde_json::Value) -> Result<T, ServerError> {
    serde_json::from_value(arguments).map_err(|e| ServerError::InvalidArgument(e.to_string()))
}

/// Handle a tool call
pub async fn handle_tool_call(
    server: &GenUiMcpServer,
    name: &str,
    arguments: serde_json::Value,
) -> Result<Vec<ToolResultContent>, ServerError> {
    match name {
        "validate_html" => handle_validate_html(server, parse_args(arguments)?).await,
        "generate_image" => handle_generate_image(server, parse_args(arguments)?).await,
        "serve_html" => handle_serve_html(server, parse_args(arguments)?).await,
        _ => Err(ServerError::UnknownTool(name.to_string())),
    }
}

async fn handle_validate_html(
    server: &GenUiMcpServer,
    args: ValidateHtmlArgs,
) -> Result<Vec<ToolResultContent>, ServerError> {
    let result = server.validate(args.html_content, args.fix_errors).await?;

    info!(
        issues = result.issues.len(),
        fixed = result.fixed_count(),
        warnings = result.warnings.len(),
        "HTML validated"
    );

    Ok(vec![
        ToolResultContent::text(result.to_text()),
        ToolResultContent::text(result.html_section()),
    ])
}

async fn handle_generate_image(
    server: &GenUiMcpServer,
    args: GenerateImageArgs,
) -> Result<Vec<ToolResultContent>, ServerError> {
    let outcome = server
        .images()
        .generate(&args.prompt, args.aspect_ratio)
        .await;
    if let Ok(image) = &outcome {
        info!(mime = %image.mime_type, bytes = image.byte_len, "Image ready");
    }

    let GenerateImageResult {
        data_url, error, ..
    } = outcome.into();
    let Some(data_url) = data_url else {
        return Err(ServerError::ImageGeneration(error.unwrap_or_default()));
    };
    let alt: String = args.prompt.chars().take(50).collect();

    Ok(vec![ToolResultContent::text(format!(
        "Image generated successfully. Use this data URL in your HTML:\n\n{url}\n\nExample usage:\n<img src=\"{url}\" alt=\"{alt}...\" />",
        url = data_url,
        alt = alt.replace('"', "&quot;"),
    ))])
}

async fn handle_serve_html(
    server: &GenUiMcpServer,
    args: ServeHtmlArgs,
) -> Result<Vec<ToolResultContent>, ServerError> {
    let page = server
        .publish_preview(&args.html_content, &args.filename, args.port)
        .await
        .map_err(|e| match e {
            ServerError::InvalidArgument(_) | ServerError::PreviewError(_) => e,
            other => ServerError::PreviewError(other.to_string()),
        })?;

    info!(url = %page.url, "Serving preview");

    Ok(vec![ToolResultContent::text(format!(
        "HTML saved and serving at:\n\n{}\n\nOpen this URL in your browser to preview the generated UI.\n\nFile saved to: {}",
        page.url,
        page.path.display()
    ))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::{Json, Router};
    use serde_json::Value;

    async fn server_with_gemini_reply(reply: Value) -> GenUiMcpServer {
        let app = Router::new().fallback(move || {
            let reply = reply.clone();
            async move { Json(reply) }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        GenUiMcpServer::new(
            ServerConfig::without_env()
                .with_gemini_api_key(Some("k".into()))
                .with_gemini_endpoint(format!("http://{}/models", addr)),
        )
    }

    #[test]
    fn test_schemas_require_primary_argument() {
        let tools = get_tool_definitions();
        let required: Vec<_> = tools
            .iter()
            .map(|t| t.input_schema["required"][0].as_str().unwrap())
            .collect();
        assert_eq!(required, vec!["html_content", "prompt", "html_content"]);

        let ratios = &tools[1].input_schema["properties"]["aspect_ratio"]["enum"];
        assert_eq!(ratios.as_array().unwrap().len(), 10);
        assert_eq!(ratios[8], "16:9");
    }

    #[test]
    fn test_argument_defaults() {
        let args: ValidateHtmlArgs = parse_args(json!({ "html_content": "<p>" })).unwrap();
        assert!(args.fix_errors);

        let args: GenerateImageArgs = parse_args(json!({ "prompt": "p" })).unwrap();
        assert_eq!(args.aspect_ratio, AspectRatio::Square);

        let args: ServeHtmlArgs = parse_args(json!({ "html_content": "x" })).unwrap();
        assert_eq!(args.filename, "preview");
        assert_eq!(args.port, None);
    }

    #[test]
    fn test_bad_arguments() {
        let err = parse_args::<ServeHtmlArgs>(json!({ "html_content": "x", "port": 70000 }))
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidArgument(_)));

        let err = parse_args::<ValidateHtmlArgs>(json!({ "html_content": 5 })).unwrap_err();
        assert!(matches!(err, ServerError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_generate_image_renders_data_url() {
        let server = server_with_gemini_reply(json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "aGk=" } }
            ]}}]
        }))
        .await;

        let content = handle_tool_call(
            &server,
            "generate_image",
            json!({ "prompt": "a \"quoted\" cat" }),
        )
        .await
        .unwrap();

        let text = serde_json::to_value(&content[0]).unwrap()["text"].clone();
        let text = text.as_str().unwrap();
        assert!(text.starts_with("Image generated successfully."));
        assert!(text.contains(r#"<img src="data:image/png;base64,aGk=" alt="a &quot;quoted&quot; cat..." />"#));
    }

    #[tokio::test]
    async fn test_generate_image_failure_message() {
        let server = server_with_gemini_reply(json!({ "candidates": [] })).await;

        let err = handle_tool_call(&server, "generate_image", json!({ "prompt": "p" }))
            .await
            .unwrap_err();
        assert_eq!(
            err.tool_message(),
            "Failed to generate image: No candidates returned from Gemini"
        );
    }
}
