//! OpenAI-style hosted chat adapter.
//!
//! Bearer-key auth, native multi-turn message list, optional
//! organization/tenant header. One `POST {base}/chat/completions` per
//! generation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use switchboard_core::memory::ConversationMemory;
use switchboard_core::types::{FunctionCall, GenerationResult, ProviderKind, Usage};
use switchboard_core::GatewayError;

use crate::traits::{http_client, require_success, transport_error, ChatBackend, HOSTED_REQUEST_TIMEOUT};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

// ─────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────

/// Resolved configuration for the OpenAI-style backend.
#[derive(Clone, Debug, PartialEq)]
pub struct OpenAiConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub streaming: bool,
    pub api_key: String,
    /// Organization/tenant id sent as a request header when present.
    pub organization_id: Option<String>,
    /// Overrides the vendor base URL (proxies, compatible gateways).
    pub api_base: Option<String>,
}

// ─────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
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
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

// ─────────────────────────────────────────────
// Adapter
// ─────────────────────────────────────────────

/// Adapter for the OpenAI-style hosted chat API.
#[derive(Debug)]
pub struct OpenAiAdapter {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiAdapter {
    /// Configure the adapter. No network I/O happens here.
    pub fn new(config: OpenAiConfig) -> Result<Self, GatewayError> {
        let client = http_client(HOSTED_REQUEST_TIMEOUT)?;
        Ok(OpenAiAdapter { client, config })
    }

    /// The resolved configuration.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        let base = self
            .config
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    /// Native message list: system instruction first, then the recorded
    /// turns, then the final user input.
    fn build_messages<'a>(
        &self,
        context: &'a ConversationMemory,
        input: &'a str,
    ) -> Vec<WireMessage<'a>> {
        let mut messages = Vec::new();
        if let Some(system) = context.system_instruction() {
            messages.push(WireMessage {
                role: "system",
                content: system,
            });
        }
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
impl ChatBackend for OpenAiAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn generate(
        &self,
        context: &ConversationMemory,
        input: &str,
    ) -> Result<GenerationResult, GatewayError> {
        let messages = self.build_messages(context, input);
        debug!(
            provider = "openai",
            model = %self.config.model,
            messages = messages.len(),
            "calling hosted chat API"
        );

        let body = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: self.config.streaming,
        };

        let mut request = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key);
        if let Some(org) = &self.config.organization_id {
            request = request.header("OpenAI-Organization", org);
        }

        let response = request.json(&body).send().await.map_err(|e| {
            error!(provider = "openai", error = %e, "HTTP request failed");
            transport_error(e)
        })?;
        let response = require_success(response).await?;

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::provider_call(None, format!("malformed response body: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::provider_call(None, "response contained no choices"))?;

        Ok(GenerationResult {
            content: choice.message.content.unwrap_or_default(),
            function_call: choice.message.function_call,
            usage: parsed.usage,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
