//! Orchestration layer for Switchboard.
//!
//! - [`orchestrator`] — the per-request flow: validate, build an adapter,
//!   replay history into memory, generate once, wrap the reply
//! - [`retrieval`] — naive local embedding + similarity ranking used by the
//!   retrieval endpoints
//! - [`store`] — the opaque persistence collaborators (message log, vector
//!   store) as traits, with in-memory implementations

pub mod orchestrator;
pub mod retrieval;
pub mod store;

// Re-export main types for convenience
pub use orchestrator::ChatOrchestrator;
pub use retrieval::{cosine_similarity, local_embedding, rank_chunks, ScoredChunk, EMBEDDING_DIM};
pub use store::{InMemoryMessageStore, InMemoryVectorStore, MessageStore, VectorStore};
