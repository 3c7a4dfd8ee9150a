//! Provider factory — builds the right adapter from a provider id and a
//! generic parameter bag.
//!
//! Construction is fail-fast: every required field is checked and every
//! provider-specific knob is bounds-checked before an adapter exists, and no
//! network I/O happens until the first `generate` call.

use switchboard_core::memory::ConversationMemory;
use switchboard_core::types::{
    ChatRequest, GenerationConfig, GenerationResult, ProviderExtras, ProviderKind, ServerConfig,
};
use switchboard_core::GatewayError;

use crate::anthropic::{AnthropicAdapter, AnthropicConfig};
use crate::google::{GoogleAdapter, GoogleConfig};
use crate::llama::{LlamaAdapter, LlamaServerConfig};
use crate::openai::{OpenAiAdapter, OpenAiConfig};
use crate::traits::ChatBackend;

// ─────────────────────────────────────────────
// Parameter bag
// ─────────────────────────────────────────────

/// Provider-agnostic fields plus the variant-specific extras, as extracted
/// from an inbound request.
#[derive(Clone, Debug, Default)]
pub struct ProviderParams {
    /// Model identifier; required for hosted backends, ignored by the
    /// self-hosted one (the server decides what it runs).
    pub model: Option<String>,
    /// API key; required for hosted backends, ignored by the self-hosted one.
    pub credential: Option<String>,
    /// Sampling temperature in [0, 1].
    pub temperature: f32,
    /// Maximum tokens in the reply; must be positive when present.
    pub max_tokens: Option<u32>,
    /// Whether the reply should be delivered incrementally.
    pub streaming: bool,
    /// Variant-specific fields.
    pub extras: ProviderExtras,
}

impl ProviderParams {
    /// Extract the factory inputs from a validated request.
    pub fn from_request(request: &ChatRequest, credential: Option<String>) -> Self {
        ProviderParams {
            model: request.model.clone(),
            credential,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            streaming: request.stream,
            extras: request.extras.clone(),
        }
    }
}

// ─────────────────────────────────────────────
// Adapter handle
// ─────────────────────────────────────────────

/// The closed set of constructed adapters.
///
/// Dispatch is an exhaustive match over the enumerated backends.
#[derive(Debug)]
pub enum ProviderAdapter {
    OpenAi(OpenAiAdapter),
    Anthropic(AnthropicAdapter),
    Google(GoogleAdapter),
    Llama(LlamaAdapter),
}

impl ProviderAdapter {
    /// Which backend this adapter talks to.
    pub fn provider(&self) -> ProviderKind {
        match self {
            ProviderAdapter::OpenAi(a) => a.provider(),
            ProviderAdapter::Anthropic(a) => a.provider(),
            ProviderAdapter::Google(a) => a.provider(),
            ProviderAdapter::Llama(a) => a.provider(),
        }
    }

    /// Produce one completion for `input` with `context` as history.
    pub async fn generate(
        &self,
        context: &ConversationMemory,
        input: &str,
    ) -> Result<GenerationResult, GatewayError> {
        match self {
            ProviderAdapter::OpenAi(a) => a.generate(context, input).await,
            ProviderAdapter::Anthropic(a) => a.generate(context, input).await,
            ProviderAdapter::Google(a) => a.generate(context, input).await,
            ProviderAdapter::Llama(a) => a.generate(context, input).await,
        }
    }
}

// ─────────────────────────────────────────────
// Construction
// ─────────────────────────────────────────────

/// Build the adapter for `kind` from the parameter bag.
///
/// Fails fast — a missing credential, missing server URL, or out-of-bounds
/// knob means no adapter is constructed at all.
pub fn build_adapter(
    kind: ProviderKind,
    params: ProviderParams,
) -> Result<ProviderAdapter, GatewayError> {
    validate_common(&params)?;

    let ProviderParams {
        model,
        credential,
        temperature,
        max_tokens,
        streaming,
        extras,
    } = params;
    let model = model.filter(|m| !m.is_empty());
    let credential = credential.filter(|k| !k.is_empty());

    match kind {
        ProviderKind::OpenAi => {
            let config = OpenAiConfig {
                model: model.ok_or_else(missing_model)?,
                temperature,
                max_tokens,
                streaming,
                api_key: credential.ok_or_else(|| missing_credential(kind))?,
                organization_id: extras.organization_id,
                api_base: extras.api_base,
            };
            Ok(ProviderAdapter::OpenAi(OpenAiAdapter::new(config)?))
        }
        ProviderKind::Anthropic => {
            let config = AnthropicConfig {
                model: model.ok_or_else(missing_model)?,
                temperature,
                max_tokens,
                streaming,
                api_key: credential.ok_or_else(|| missing_credential(kind))?,
                api_base: extras.api_base,
            };
            Ok(ProviderAdapter::Anthropic(AnthropicAdapter::new(config)?))
        }
        ProviderKind::Google => {
            let generation = extras.generation_config.unwrap_or_default();
            validate_generation_config(&generation)?;
            let config = GoogleConfig {
                model: model.ok_or_else(missing_model)?,
                temperature,
                max_tokens,
                streaming,
                api_key: credential.ok_or_else(|| missing_credential(kind))?,
                safety_settings: extras.safety_settings,
                generation,
                api_base: extras.api_base,
            };
            Ok(ProviderAdapter::Google(GoogleAdapter::new(config)?))
        }
        ProviderKind::Llama => {
            let server_url = parse_server_url(extras.server_url.as_deref())?;
            let server = extras.server_config.unwrap_or_default();
            validate_server_config(&server)?;
            let config = LlamaServerConfig {
                temperature,
                max_tokens,
                streaming,
                server_url,
                request_timeout: server.request_timeout,
                n_ctx: server.n_ctx,
                n_batch: server.n_batch,
                repeat_penalty: server.repeat_penalty,
                top_k: server.top_k,
                top_p: server.top_p,
                stop_words: server.stop_words,
            };
            Ok(ProviderAdapter::Llama(LlamaAdapter::new(config)?))
        }
    }
}

fn validate_common(params: &ProviderParams) -> Result<(), GatewayError> {
    if !(0.0..=1.0).contains(&params.temperature) {
        return Err(GatewayError::InvalidRequest(format!(
            "temperature must be within [0, 1], got {}",
            params.temperature
        )));
    }
    if params.max_tokens == Some(0) {
        return Err(GatewayError::InvalidRequest(
            "max_tokens must be positive".to_string(),
        ));
    }
    Ok(())
}

fn missing_model() -> GatewayError {
    GatewayError::InvalidRequest("model is required".to_string())
}

fn missing_credential(kind: ProviderKind) -> GatewayError {
    GatewayError::Authentication(format!("missing API key for provider {kind}"))
}

fn parse_server_url(raw: Option<&str>) -> Result<reqwest::Url, GatewayError> {
    let raw = raw.ok_or_else(|| {
        GatewayError::InvalidRequest("server_url is required for the llama provider".to_string())
    })?;
    let url = reqwest::Url::parse(raw).map_err(|e| {
        GatewayError::InvalidRequest(format!("server_url is not a valid absolute URL: {e}"))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(GatewayError::InvalidRequest(format!(
            "server_url must use http or https, got {}",
            url.scheme()
        )));
    }
    Ok(url)
}

fn validate_generation_config(config: &GenerationConfig) -> Result<(), GatewayError> {
    if !(1..=8).contains(&config.candidate_count) {
        return Err(GatewayError::InvalidRequest(format!(
            "candidate_count must be within [1, 8], got {}",
            config.candidate_count
        )));
    }
    if config.top_k < 1 {
        return Err(GatewayError::InvalidRequest(
            "top_k must be at least 1".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&config.top_p) {
        return Err(GatewayError::InvalidRequest(format!(
            "top_p must be within [0, 1], got {}",
            config.top_p
        )));
    }
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), GatewayError> {
    if config.request_timeout < 1 {
        return Err(GatewayError::InvalidRequest(
            "request_timeout must be at least 1 second".to_string(),
        ));
    }
    if config.n_ctx < 512 {
        return Err(GatewayError::InvalidRequest(format!(
            "n_ctx must be at least 512, got {}",
            config.n_ctx
        )));
    }
    if config.n_batch < 1 {
        return Err(GatewayError::InvalidRequest(
            "n_batch must be at least 1".to_string(),
        ));
    }
    if config.repeat_penalty < 0.0 {
        return Err(GatewayError::InvalidRequest(format!(
            "repeat_penalty must be non-negative, got {}",
            config.repeat_penalty
        )));
    }
    if config.top_k < 1 {
        return Err(GatewayError::InvalidRequest(
            "top_k must be at least 1".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&config.top_p) {
        return Err(GatewayError::InvalidRequest(format!(
            "top_p must be within [0, 1], got {}",
            config.top_p
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
