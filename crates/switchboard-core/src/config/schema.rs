//! Settings schema — the typed configuration tree.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! `#[serde(rename_all = "camelCase")]` handles the conversion.

use serde::{Deserialize, Serialize};

use crate::types::ProviderKind;

// ─────────────────────────────────────────────
// Root Settings
// ─────────────────────────────────────────────

/// Root settings — loaded from `~/.switchboard/config.json` + env vars,
/// constructed once at process start and read-only thereafter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub server: ServerSettings,
    pub providers: ProviderSettings,
}

impl Settings {
    /// The process-wide API key for a backend, if one is configured.
    ///
    /// The self-hosted backend has no credential; this always returns `None`
    /// for it.
    pub fn api_key_for(&self, kind: ProviderKind) -> Option<&str> {
        let key = match kind {
            ProviderKind::OpenAi => self.providers.openai.api_key.as_str(),
            ProviderKind::Anthropic => self.providers.anthropic.api_key.as_str(),
            ProviderKind::Google => self.providers.google.api_key.as_str(),
            ProviderKind::Llama => return None,
        };
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    /// Whether `key` matches the configured credential for `kind`.
    ///
    /// False when no credential is configured (nothing to match against).
    pub fn verify_api_key(&self, kind: ProviderKind, key: &str) -> bool {
        matches!(self.api_key_for(kind), Some(configured) if configured == key)
    }
}

// ─────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────

/// Listen address and debug flag for the surrounding HTTP surface.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub debug: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            debug: false,
        }
    }
}

// ─────────────────────────────────────────────
// Provider credentials
// ─────────────────────────────────────────────

/// Credentials for the hosted backends. The self-hosted backend needs none —
/// its network-reachable URL is the trust boundary.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSettings {
    pub openai: OpenAiCredentials,
    pub anthropic: CredentialConfig,
    pub google: CredentialConfig,
}

/// API key for one hosted backend. Empty = not configured.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialConfig {
    #[serde(default)]
    pub api_key: String,
}

impl CredentialConfig {
    /// Whether a key is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// OpenAI-style credentials: an API key plus an optional organization id
/// attached to every request from this process.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenAiCredentials {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

impl OpenAiCredentials {
    /// Whether a key is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
