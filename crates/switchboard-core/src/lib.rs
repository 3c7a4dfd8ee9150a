//! Core layer for Switchboard — the shared vocabulary of the gateway.
//!
//! # Architecture
//!
//! - [`types`] — chat messages, request/response contracts, provider
//!   identifiers, and the provider-specific parameter bags
//! - [`memory`] — per-request conversation memory with a two-phase turn
//!   builder
//! - [`error`] — the gateway error taxonomy
//! - [`config`] — process-wide settings, loaded once at startup and passed
//!   by reference into everything that needs credentials

pub mod config;
pub mod error;
pub mod memory;
pub mod types;

// Re-export main types for convenience
pub use config::schema::Settings;
pub use error::GatewayError;
pub use memory::{ConversationMemory, Turn, TurnHandle};
pub use types::{
    ChatRequest, ChatResponse, FunctionCall, GenerationResult, Message, ProviderKind, Role,
};
