//! Wire request construction for the Messages API.
//!
//! Pure value building, no I/O. The ephemeral-cache marker is a protocol
//! hint interpreted by the remote provider; nothing is cached locally.

use maxline_config::Config;
use maxline_types::{MaxlineError, traits::Result};
use serde::Serialize;

/// Cache-control hint value understood by the provider.
pub const CACHE_TYPE_EPHEMERAL: &str = "ephemeral";

/// Prompt-caching annotation on a system block.
#[derive(Debug, Clone, Serialize)]
pub struct CacheControl {
    #[serde(rename = "type")]
    pub control_type: String,
}

/// A typed system context block.
#[derive(Debug, Clone, Serialize)]
pub struct SystemBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

/// A single conversation message.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Request body for a streaming invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RequestBody {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_thinking_tokens: Option<u32>,
    pub stream: bool,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<Vec<SystemBlock>>,
}

/// Build the request body for `prompt` with optional cacheable system
/// context.
///
/// The `system` key is present iff `system_context` is non-empty and caching
/// is enabled in the configuration; it is never an empty block.
///
/// # Errors
///
/// Returns [`MaxlineError::Validation`] if `prompt` is empty.
pub fn build_request_body(
    config: &Config,
    prompt: &str,
    system_context: Option<&str>,
) -> Result<RequestBody> {
    if prompt.is_empty() {
        return Err(MaxlineError::Validation("prompt must not be empty".into()));
    }

    let system = match system_context {
        Some(ctx) if !ctx.is_empty() && config.enable_prompt_caching => Some(vec![SystemBlock {
            block_type: "text".to_string(),
            text: ctx.to_string(),
            cache_control: Some(CacheControl {
                control_type: CACHE_TYPE_EPHEMERAL.to_string(),
            }),
        }]),
        _ => None,
    };

    Ok(RequestBody {
        model: config.model_id.clone(),
        max_tokens: config.max_output_tokens,
        max_thinking_tokens: (config.max_thinking_tokens > 0).then_some(config.max_thinking_tokens),
        stream: true,
        messages: vec![Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        system,
    })
}
