//! Gateway error taxonomy.
//!
//! Every failure a caller can observe maps to one of these variants. The
//! orchestrator never swallows or retries: a request either fully succeeds or
//! surfaces exactly one of these with a human-readable detail string.

use thiserror::Error;

/// Errors surfaced by the provider core and the orchestration layer.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Unknown provider identifier. Fatal, user-correctable.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Malformed input: empty message list, last message not user-authored,
    /// out-of-bounds sampling parameters, missing server URL, and similar.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Bad or missing credentials. Surfaced distinctly so callers can prompt
    /// for a new key.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network or backend failure, including non-2xx upstream responses.
    /// Transient, but never retried at this layer.
    #[error("provider call failed: {detail}")]
    ProviderCall {
        /// Upstream HTTP status, when one was received.
        status: Option<u16>,
        detail: String,
    },

    /// An assistant reply appeared in the replayed history with no open user
    /// turn to attach to. Indicates malformed conversation history.
    #[error("assistant reply at position {position} has no open user turn")]
    DanglingReply { position: usize },
}

impl GatewayError {
    /// Wrap an upstream failure, attaching the HTTP status when known.
    pub fn provider_call(status: Option<u16>, detail: impl Into<String>) -> Self {
        GatewayError::ProviderCall {
            status,
            detail: detail.into(),
        }
    }

    /// The HTTP status a route handler should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::UnsupportedProvider(_) => 400,
            GatewayError::InvalidRequest(_) => 400,
            GatewayError::Authentication(_) => 401,
            GatewayError::ProviderCall { .. } => 502,
            GatewayError::DanglingReply { .. } => 400,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
