//! Self-hosted inference server adapter.
//!
//! No credentials — the network-reachable URL is the trust boundary. The
//! server speaks a plain completion protocol with no multi-turn structure,
//! so the whole conversation is flattened into one instruction-formatted
//! prompt string before the call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use switchboard_core::memory::ConversationMemory;
use switchboard_core::types::{GenerationResult, ProviderKind};
use switchboard_core::GatewayError;

use crate::traits::{http_client, transport_error, ChatBackend};

// ─────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────

/// Resolved configuration for the self-hosted inference server.
#[derive(Clone, Debug, PartialEq)]
pub struct LlamaServerConfig {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub streaming: bool,
    /// Base URL of the server; the adapter appends `/v1/completions`.
    pub server_url: reqwest::Url,
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
    pub stop_words: Option<Vec<String>>,
}

// ─────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: String,
    temperature: f32,
    max_tokens: Option<u32>,
    stream: bool,
    n_ctx: u32,
    n_batch: u32,
    repeat_penalty: f32,
    top_k: u32,
    top_p: f32,
    stop: Option<&'a [String]>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    text: String,
}

// ─────────────────────────────────────────────
// Prompt rendering
// ─────────────────────────────────────────────

/// Flatten the conversation into the instruction format the server expects.
///
/// The final user message always renders as
/// `### Instruction: <message>\n\n### Response:`; prior turns and the system
/// instruction, when present, are serialized as plain-text sections above it.
pub fn render_prompt(context: &ConversationMemory, input: &str) -> String {
    let mut sections = Vec::new();
    if let Some(system) = context.system_instruction() {
        sections.push(system.to_string());
    }
    for turn in context.as_prompt_context() {
        sections.push(format!(
            "Human: {}\nAssistant: {}",
            turn.input,
            turn.output_or_empty()
        ));
    }
    sections.push(format!("### Instruction: {input}\n\n### Response:"));
    sections.join("\n\n")
}

// ─────────────────────────────────────────────
// Adapter
// ─────────────────────────────────────────────

/// Adapter for a self-hosted completion server.
#[derive(Debug)]
pub struct LlamaAdapter {
    client: reqwest::Client,
    config: LlamaServerConfig,
}

impl LlamaAdapter {
    /// Configure the adapter, binding the request timeout into the HTTP
    /// client. No network I/O happens here.
    pub fn new(config: LlamaServerConfig) -> Result<Self, GatewayError> {
        let client = http_client(std::time::Duration::from_secs(config.request_timeout))?;
        Ok(LlamaAdapter { client, config })
    }

    /// The resolved configuration.
    pub fn config(&self) -> &LlamaServerConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        let base = self.config.server_url.as_str().trim_end_matches('/');
        format!("{base}/v1/completions")
    }
}

#[async_trait]
impl ChatBackend for LlamaAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Llama
    }

    async fn generate(
        &self,
        context: &ConversationMemory,
        input: &str,
    ) -> Result<GenerationResult, GatewayError> {
        let prompt = render_prompt(context, input);
        debug!(
            provider = "llama",
            server = %self.config.server_url,
            prompt_chars = prompt.len(),
            "calling inference server"
        );

        let body = CompletionRequest {
            prompt,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: self.config.streaming,
            n_ctx: self.config.n_ctx,
            n_batch: self.config.n_batch,
            repeat_penalty: self.config.repeat_penalty,
            top_k: self.config.top_k,
            top_p: self.config.top_p,
            stop: self.config.stop_words.as_deref(),
        };

        let response = self
            .client
            .post(self.completions_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "llama", error = %e, "HTTP request failed");
                transport_error(e)
            })?;

        // No credential exists for this backend; every non-2xx is a
        // provider failure, 401 included.
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            error!(provider = "llama", status = %status, body = %body, "server error");
            return Err(GatewayError::provider_call(
                Some(status.as_u16()),
                format!("inference server returned {}: {body}", status.as_u16()),
            ));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::provider_call(None, format!("malformed response body: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::provider_call(None, "response contained no choices"))?;

        Ok(GenerationResult::text(choice.text.trim()))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_config(server_url: &str) -> LlamaServerConfig {
        LlamaServerConfig {
            temperature: 0.7,
            max_tokens: None,
            streaming: false,
            server_url: reqwest::Url::parse(server_url).unwrap(),
            request_timeout: 120,
            n_ctx: 2048,
            n_batch: 512,
            repeat_penalty: 1.1,
            top_k: 40,
            top_p: 0.95,
            stop_words: None,
        }
    }

    // ── Prompt rendering ──

    #[test]
    fn test_render_prompt_bare_message() {
        let memory = ConversationMemory::new();
        let prompt = render_prompt(&memory, "What is the capital of Brazil?");
        assert_eq!(
            prompt,
            "### Instruction: What is the capital of Brazil?\n\n### Response:"
        );
    }

    #[test]
    fn test_render_prompt_with_history() {
        let mut memory = ConversationMemory::new();
        let turn = memory.open_turn("Hi");
        memory.close_turn(turn, "Hello!");

        let prompt = render_prompt(&memory, "How are you?");
        assert_eq!(
            prompt,
            "Human: Hi\nAssistant: Hello!\n\n### Instruction: How are you?\n\n### Response:"
        );
    }

    #[test]
    fn test_render_prompt_with_system_instruction() {
        let mut memory = ConversationMemory::new();
        memory.set_system_instruction("Answer briefly.");

        let prompt = render_prompt(&memory, "Why is the sky blue?");
        assert!(prompt.starts_with("Answer briefly.\n\n"));
        assert!(prompt.ends_with("### Instruction: Why is the sky blue?\n\n### Response:"));
    }

    #[test]
    fn test_render_prompt_open_turn_has_empty_reply() {
        let mut memory = ConversationMemory::new();
        let _open = memory.open_turn("anyone?");

        let prompt = render_prompt(&memory, "hello?");
        assert!(prompt.contains("Human: anyone?\nAssistant: \n\n"));
    }

    // ── HTTP behavior ──

    #[tokio::test]
    async fn test_generate_sends_full_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .and(body_partial_json(serde_json::json!({
                "prompt": "### Instruction: What is the capital of Brazil?\n\n### Response:",
                "temperature": 0.7,
                "stream": false,
                "n_ctx": 2048,
                "n_batch": 512,
                "repeat_penalty": 1.1,
                "top_k": 40,
                "top_p": 0.95
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"text": "  Brasília.\n"}]
            })))
            .mount(&mock_server)
            .await;

        let adapter = LlamaAdapter::new(make_config(&mock_server.uri())).unwrap();
        let result = adapter
            .generate(&ConversationMemory::new(), "What is the capital of Brazil?")
            .await
            .unwrap();

        // Surrounding whitespace is trimmed before returning
        assert_eq!(result.content, "Brasília.");
    }

    #[tokio::test]
    async fn test_generate_sends_stop_words() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .and(body_partial_json(serde_json::json!({"stop": ["###", "End"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"text": "ok"}]
            })))
            .mount(&mock_server)
            .await;

        let mut config = make_config(&mock_server.uri());
        config.stop_words = Some(vec!["###".to_string(), "End".to_string()]);
        let adapter = LlamaAdapter::new(config).unwrap();

        let result = adapter.generate(&ConversationMemory::new(), "Hi").await.unwrap();
        assert_eq!(result.content, "ok");
    }

    #[tokio::test]
    async fn test_generate_server_error_carries_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&mock_server)
            .await;

        let adapter = LlamaAdapter::new(make_config(&mock_server.uri())).unwrap();
        let err = adapter
            .generate(&ConversationMemory::new(), "Hi")
            .await
            .unwrap_err();

        match err {
            GatewayError::ProviderCall { status, detail } => {
                assert_eq!(status, Some(500));
                assert!(detail.contains("500"));
                assert!(detail.contains("model not loaded"));
            }
            other => panic!("expected ProviderCall, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_unauthorized_is_not_authentication() {
        // No credential exists for this backend, so a 401 from the server is
        // an upstream failure, not an AuthenticationError.
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
            .mount(&mock_server)
            .await;

        let adapter = LlamaAdapter::new(make_config(&mock_server.uri())).unwrap();
        let err = adapter
            .generate(&ConversationMemory::new(), "Hi")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ProviderCall { status: Some(401), .. }));
    }

    #[tokio::test]
    async fn test_generate_transport_error() {
        let adapter = LlamaAdapter::new(make_config("http://127.0.0.1:1")).unwrap();
        let err = adapter
            .generate(&ConversationMemory::new(), "Hi")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ProviderCall { status: None, .. }));
    }
}
