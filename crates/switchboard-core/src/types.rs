//! Chat types shared by every provider backend.
//!
//! These model the gateway's inbound/outbound contract: a `messages` list in,
//! one assistant message out. Roles are a closed enum so malformed histories
//! fail at deserialization instead of deep inside an adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

// ─────────────────────────────────────────────
// Provider identifiers
// ─────────────────────────────────────────────

/// The closed set of supported backends.
///
/// Hosted APIs authenticate with an API key; `Llama` talks to a
/// caller-supplied self-hosted inference server and needs no credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Google,
    Llama,
}

impl ProviderKind {
    /// Stable lowercase name, as used in routes and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
            ProviderKind::Llama => "llama",
        }
    }

    /// Whether this backend requires an API key.
    pub fn requires_credential(&self) -> bool {
        !matches!(self, ProviderKind::Llama)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "google" => Ok(ProviderKind::Google),
            "llama" => Ok(ProviderKind::Llama),
            other => Err(GatewayError::UnsupportedProvider(other.to_string())),
        }
    }
}

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single chat message.
///
/// Immutable once appended to a request; ordering is conversation order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Optional sender name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Structured function-call payload, when the backend produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
            name: None,
            function_call: None,
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
            name: None,
            function_call: None,
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: content.into(),
            name: None,
            function_call: None,
        }
    }
}

/// A function call requested by the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function to invoke.
    pub name: String,
    /// JSON arguments payload.
    pub arguments: serde_json::Value,
}

// ─────────────────────────────────────────────
// Provider-specific extras
// ─────────────────────────────────────────────

/// One per-category content filter for the Google-style backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SafetySetting {
    /// Content category, e.g. `"HARM_CATEGORY_HARASSMENT"`.
    pub category: String,
    /// Tolerance level, e.g. `"BLOCK_HIGH"`.
    pub threshold: String,
}

/// Sampling block for the Google-style backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Number of alternative responses to generate (1–8).
    pub candidate_count: u32,
    /// Sequences that stop generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    /// Tokens considered at each sampling step.
    pub top_k: u32,
    /// Nucleus-sampling cumulative probability.
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            candidate_count: 1,
            stop_sequences: None,
            top_k: 40,
            top_p: 0.95,
        }
    }
}

/// Advanced knobs for the self-hosted inference server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Seconds to wait for the server before giving up.
    pub request_timeout: u64,
    /// Context window size in tokens.
    pub n_ctx: u32,
    /// Batch size for prompt processing.
    pub n_batch: u32,
    /// Penalty applied to repeated tokens.
    pub repeat_penalty: f32,
    /// Tokens considered at each sampling step.
    pub top_k: u32,
    /// Nucleus-sampling cumulative probability.
    pub top_p: f32,
    /// Sequences that stop generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_words: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            request_timeout: 120,
            n_ctx: 2048,
            n_batch: 512,
            repeat_penalty: 1.1,
            top_k: 40,
            top_p: 0.95,
            stop_words: None,
        }
    }
}

/// Provider-specific fields a request may carry on top of the universal ones.
///
/// Each backend reads only the fields it understands; the factory applies the
/// documented defaults for anything absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderExtras {
    /// Custom API base URL for a hosted backend (overrides the vendor
    /// default; useful for proxies and compatible gateways).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// OpenAI-style organization/tenant id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Google-style per-category content thresholds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<Vec<SafetySetting>>,
    /// Google-style sampling block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    /// Base URL of the self-hosted inference server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    /// Advanced knobs for the self-hosted inference server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_config: Option<ServerConfig>,
}

// ─────────────────────────────────────────────
// Request / response contract
// ─────────────────────────────────────────────

fn default_temperature() -> f32 {
    0.7
}

/// An inbound chat request.
///
/// The last message must be user-authored; everything before it is replayed
/// into conversation memory as history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far, oldest first.
    pub messages: Vec<Message>,
    /// Model identifier. Optional for the self-hosted backend, where the
    /// model is whatever the server has loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Sampling temperature in [0, 1].
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens in the reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Whether the reply should be delivered incrementally.
    #[serde(default)]
    pub stream: bool,
    /// Provider-specific fields, flattened into the request body.
    #[serde(flatten)]
    pub extras: ProviderExtras,
}

impl ChatRequest {
    /// Minimal request: one history plus defaults everywhere else.
    pub fn new(messages: Vec<Message>) -> Self {
        ChatRequest {
            messages,
            model: None,
            temperature: default_temperature(),
            max_tokens: None,
            stream: false,
            extras: ProviderExtras::default(),
        }
    }

    /// Check the request preconditions: at least one message, every content
    /// non-empty, and the final message user-authored.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let last = self.messages.last().ok_or_else(|| {
            GatewayError::InvalidRequest("messages must not be empty".to_string())
        })?;
        if last.role != Role::User {
            return Err(GatewayError::InvalidRequest(
                "the last message must have role \"user\"".to_string(),
            ));
        }
        if let Some(pos) = self.messages.iter().position(|m| m.content.is_empty()) {
            return Err(GatewayError::InvalidRequest(format!(
                "message at position {pos} has empty content"
            )));
        }
        Ok(())
    }
}

/// Token accounting reported by a backend, when available.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// What one generation call produced.
///
/// The role is always assistant; callers wrap this into a [`Message`] via
/// [`GenerationResult::into_message`].
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationResult {
    /// Generated text.
    pub content: String,
    /// Structured function call, when the backend emitted one.
    pub function_call: Option<FunctionCall>,
    /// Token accounting, when the backend reported it.
    pub usage: Option<Usage>,
}

impl GenerationResult {
    /// Plain-text result with no function call or usage attached.
    pub fn text(content: impl Into<String>) -> Self {
        GenerationResult {
            content: content.into(),
            function_call: None,
            usage: None,
        }
    }

    /// Wrap the result as an assistant message.
    pub fn into_message(self) -> Message {
        Message {
            role: Role::Assistant,
            content: self.content,
            name: None,
            function_call: self.function_call,
        }
    }
}

/// The outbound response: one assistant message per request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub created: DateTime<Utc>,
}

impl ChatResponse {
    /// Build the response envelope around a generation result.
    pub fn from_result(result: GenerationResult) -> Self {
        let usage = result.usage.clone();
        ChatResponse {
            message: result.into_message(),
            usage,
            created: Utc::now(),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
