//! Opaque persistence collaborators.
//!
//! The core never requires these — a surrounding route consults them when it
//! chooses to log a conversation or fetch retrieval context before invoking
//! the orchestrator. The traits define the seam; the in-memory
//! implementations back tests and single-process deployments.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use switchboard_core::types::Message;

use crate::retrieval::{cosine_similarity, ScoredChunk};

// ─────────────────────────────────────────────
// Message persistence
// ─────────────────────────────────────────────

/// Append-only message log, keyed by chat id.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append one message to a chat's history.
    async fn append(&self, chat_id: &str, message: Message) -> anyhow::Result<()>;

    /// All messages for a chat, oldest first. Empty for unknown chats.
    async fn list(&self, chat_id: &str) -> anyhow::Result<Vec<Message>>;
}

/// In-memory message log.
#[derive(Default)]
pub struct InMemoryMessageStore {
    chats: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, chat_id: &str, message: Message) -> anyhow::Result<()> {
        let mut chats = self.chats.write().unwrap();
        chats.entry(chat_id.to_string()).or_default().push(message);
        Ok(())
    }

    async fn list(&self, chat_id: &str) -> anyhow::Result<Vec<Message>> {
        let chats = self.chats.read().unwrap();
        Ok(chats.get(chat_id).cloned().unwrap_or_default())
    }
}

// ─────────────────────────────────────────────
// Vector store
// ─────────────────────────────────────────────

/// Similarity store over embedded chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace a chunk by id.
    async fn upsert(&self, id: &str, content: &str, embedding: Vec<f32>) -> anyhow::Result<()>;

    /// The `k` chunks most similar to the query embedding, best first.
    async fn query(&self, embedding: &[f32], k: usize) -> anyhow::Result<Vec<ScoredChunk>>;
}

struct StoredChunk {
    id: String,
    content: String,
    embedding: Vec<f32>,
}

/// In-memory vector store with linear-scan similarity search.
#[derive(Default)]
pub struct InMemoryVectorStore {
    chunks: RwLock<Vec<StoredChunk>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, id: &str, content: &str, embedding: Vec<f32>) -> anyhow::Result<()> {
        let mut chunks = self.chunks.write().unwrap();
        if let Some(existing) = chunks.iter_mut().find(|c| c.id == id) {
            existing.content = content.to_string();
            existing.embedding = embedding;
        } else {
            chunks.push(StoredChunk {
                id: id.to_string(),
                content: content.to_string(),
                embedding,
            });
        }
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> anyhow::Result<Vec<ScoredChunk>> {
        let chunks = self.chunks.read().unwrap();
        let mut scored: Vec<ScoredChunk> = chunks
            .iter()
            .map(|chunk| ScoredChunk {
                content: chunk.content.clone(),
                similarity: cosine_similarity(embedding, &chunk.embedding),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
