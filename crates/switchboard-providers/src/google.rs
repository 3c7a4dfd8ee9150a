//! Google-style hosted chat adapter.
//!
//! Bearer-key auth, a `contents` list with `user`/`model` roles, per-category
//! safety thresholds, and a camelCase sampling block. The backend has no
//! discrete system slot, so the system instruction is converted to a leading
//! human-role turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use switchboard_core::memory::ConversationMemory;
use switchboard_core::types::{GenerationConfig, GenerationResult, ProviderKind, SafetySetting};
use switchboard_core::GatewayError;

use crate::traits::{http_client, require_success, transport_error, ChatBackend, HOSTED_REQUEST_TIMEOUT};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// ─────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────

/// Resolved configuration for the Google-style backend.
#[derive(Clone, Debug, PartialEq)]
pub struct GoogleConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub streaming: bool,
    pub api_key: String,
    /// Per-category content thresholds; omitted from the wire when empty.
    pub safety_settings: Option<Vec<SafetySetting>>,
    /// Sampling block (candidate count, top-k, top-p, stop sequences).
    pub generation: GenerationConfig,
    /// Overrides the vendor base URL.
    pub api_base: Option<String>,
}

// ─────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    safety_settings: Option<&'a [SafetySetting]>,
    generation_config: WireGenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig<'a> {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    candidate_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<&'a [String]>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

// ─────────────────────────────────────────────
// Adapter
// ─────────────────────────────────────────────

/// Adapter for the Google-style hosted chat API.
#[derive(Debug)]
pub struct GoogleAdapter {
    client: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleAdapter {
    /// Configure the adapter. No network I/O happens here.
    pub fn new(config: GoogleConfig) -> Result<Self, GatewayError> {
        let client = http_client(HOSTED_REQUEST_TIMEOUT)?;
        Ok(GoogleAdapter { client, config })
    }

    /// The resolved configuration.
    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    fn generate_url(&self) -> String {
        let base = self
            .config
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/');
        format!("{base}/models/{}:generateContent", self.config.model)
    }

    /// Contents list: system instruction as a leading human turn (the
    /// backend has no system role), then recorded turns, then the input.
    fn build_contents<'a>(
        &self,
        context: &'a ConversationMemory,
        input: &'a str,
    ) -> Vec<Content<'a>> {
        let mut contents = Vec::new();
        if let Some(system) = context.system_instruction() {
            contents.push(Content {
                role: "user",
                parts: vec![Part { text: system }],
            });
        }
        for turn in context.as_prompt_context() {
            contents.push(Content {
                role: "user",
                parts: vec![Part { text: &turn.input }],
            });
            if let Some(output) = &turn.output {
                contents.push(Content {
                    role: "model",
                    parts: vec![Part { text: output }],
                });
            }
        }
        contents.push(Content {
            role: "user",
            parts: vec![Part { text: input }],
        });
        contents
    }
}

#[async_trait]
impl ChatBackend for GoogleAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn generate(
        &self,
        context: &ConversationMemory,
        input: &str,
    ) -> Result<GenerationResult, GatewayError> {
        let contents = self.build_contents(context, input);
        debug!(
            provider = "google",
            model = %self.config.model,
            contents = contents.len(),
            "calling hosted chat API"
        );

        let body = GenerateContentRequest {
            contents,
            safety_settings: self.config.safety_settings.as_deref(),
            generation_config: WireGenerationConfig {
                temperature: self.config.temperature,
                top_k: self.config.generation.top_k,
                top_p: self.config.generation.top_p,
                candidate_count: self.config.generation.candidate_count,
                max_output_tokens: self.config.max_tokens,
                stop_sequences: self.config.generation.stop_sequences.as_deref(),
            },
        };

        let response = self
            .client
            .post(self.generate_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "google", error = %e, "HTTP request failed");
                transport_error(e)
            })?;
        let response = require_success(response).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::provider_call(None, format!("malformed response body: {e}")))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::provider_call(None, "response contained no candidates"))?;
        let content: String = candidate
            .content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(GenerationResult {
            content,
            function_call: None,
            usage: None,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
