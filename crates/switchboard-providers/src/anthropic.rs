//! Anthropic-style hosted chat adapter.
//!
//! Bearer-key auth and a native multi-turn message list. Unlike the
//! OpenAI-style wire, the system instruction travels in a discrete top-level
//! `system` field, and the reply comes back as a list of content blocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use switchboard_core::memory::ConversationMemory;
use switchboard_core::types::{GenerationResult, ProviderKind, Usage};
use switchboard_core::GatewayError;

use crate::traits::{http_client, require_success, transport_error, ChatBackend, HOSTED_REQUEST_TIMEOUT};

const DEFAULT_API_BASE: &str = "https://api.anthropic.com";

// ─────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────

/// Resolved configuration for the Anthropic-style backend.
#[derive(Clone, Debug, PartialEq)]
pub struct AnthropicConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub streaming: bool,
    pub api_key: String,
    /// Overrides the vendor base URL.
    pub api_base: Option<String>,
}

// ─────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// ─────────────────────────────────────────────
// Adapter
// ─────────────────────────────────────────────

/// Adapter for the Anthropic-style hosted chat API.
#[derive(Debug)]
pub struct AnthropicAdapter {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicAdapter {
    /// Configure the adapter. No network I/O happens here.
    pub fn new(config: AnthropicConfig) -> Result<Self, GatewayError> {
        let client = http_client(HOSTED_REQUEST_TIMEOUT)?;
        Ok(AnthropicAdapter { client, config })
    }

    /// The resolved configuration.
    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn messages_url(&self) -> String {
        let base = self
            .config
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/');
        format!("{base}/v1/messages")
    }

    fn build_messages<'a>(
        &self,
        context: &'a ConversationMemory,
        input: &'a str,
    ) -> Vec<WireMessage<'a>> {
        let mut messages = Vec::new();
        for turn in context.as_prompt_context() {
            messages.push(WireMessage {
                role: "user",
                content: &turn.input,
            });
            if let Some(output) = &turn.output {
                messages.push(WireMessage {
                    role: "assistant",
                    content: output,
                });
            }
        }
        messages.push(WireMessage {
            role: "user",
            content: input,
        });
        messages
    }
}

#[async_trait]
impl ChatBackend for AnthropicAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn generate(
        &self,
        context: &ConversationMemory,
        input: &str,
    ) -> Result<GenerationResult, GatewayError> {
        let messages = self.build_messages(context, input);
        debug!(
            provider = "anthropic",
            model = %self.config.model,
            messages = messages.len(),
            "calling hosted chat API"
        );

        let body = MessagesRequest {
            model: &self.config.model,
            system: context.system_instruction(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: self.config.streaming,
        };

        let response = self
            .client
            .post(self.messages_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "anthropic", error = %e, "HTTP request failed");
                transport_error(e)
            })?;
        let response = require_success(response).await?;

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::provider_call(None, format!("malformed response body: {e}")))?;

        if parsed.content.is_empty() {
            return Err(GatewayError::provider_call(
                None,
                "response contained no content blocks",
            ));
        }
        let content: String = parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(GenerationResult {
            content,
            function_call: None,
            usage: parsed.usage,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
