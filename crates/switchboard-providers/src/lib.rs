//! Backend adapters for Switchboard.
//!
//! Each supported backend gets one adapter translating the provider-agnostic
//! generation contract into its native call:
//!
//! - [`openai`] — OpenAI-style hosted chat API (bearer key, organization id)
//! - [`anthropic`] — Anthropic-style hosted chat API (discrete system slot)
//! - [`google`] — Google-style hosted chat API (safety thresholds, sampling
//!   block, system instruction folded into a leading human turn)
//! - [`llama`] — self-hosted inference server (flattened instruction prompt)
//!
//! [`factory::build_adapter`] turns a provider id plus a generic parameter
//! bag into the right adapter, fail-fast and without any network I/O.

pub mod anthropic;
pub mod factory;
pub mod google;
pub mod llama;
pub mod openai;
pub mod traits;

// Re-export main types for convenience
pub use factory::{build_adapter, ProviderAdapter, ProviderParams};
pub use traits::ChatBackend;
