//! The backend capability seam.
//!
//! Every adapter implements [`ChatBackend`]: configured at construction,
//! then asked for exactly one generation per request. No retries, no
//! backoff — upstream failures surface unchanged to the orchestrator.

use std::time::Duration;

use async_trait::async_trait;

use switchboard_core::memory::ConversationMemory;
use switchboard_core::types::{GenerationResult, ProviderKind};
use switchboard_core::GatewayError;

/// Default timeout for hosted-API calls. The self-hosted adapter carries its
/// own configurable timeout instead.
pub(crate) const HOSTED_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Trait all backend adapters implement.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Which backend this adapter talks to.
    fn provider(&self) -> ProviderKind;

    /// Produce a completion for `input`, with `context` as the prior
    /// conversation. Called once per request.
    async fn generate(
        &self,
        context: &ConversationMemory,
        input: &str,
    ) -> Result<GenerationResult, GatewayError>;
}

/// Build the HTTP client an adapter holds for its lifetime.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GatewayError::provider_call(None, format!("failed to build HTTP client: {e}")))
}

/// Classify a hosted-API response status.
///
/// 401/403 become [`GatewayError::Authentication`] so callers can prompt for
/// a new key; any other non-2xx becomes [`GatewayError::ProviderCall`] with
/// the upstream status and body attached.
pub(crate) async fn require_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "failed to read error body".to_string());
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        Err(GatewayError::Authentication(format!(
            "upstream rejected credentials ({}): {body}",
            status.as_u16()
        )))
    } else {
        Err(GatewayError::provider_call(
            Some(status.as_u16()),
            format!("upstream returned {}: {body}", status.as_u16()),
        ))
    }
}

/// Wrap a transport-level failure (connect, timeout, DNS) as a provider-call
/// error with no upstream status.
pub(crate) fn transport_error(e: reqwest::Error) -> GatewayError {
    GatewayError::provider_call(None, format!("transport error: {e}"))
}
