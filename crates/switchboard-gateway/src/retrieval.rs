//! Naive local embedding pipeline.
//!
//! A hashing-based stand-in for a real embedding model: deterministic,
//! dependency-free, and shaped like the hosted embeddings it substitutes for
//! (1536 dimensions, unit norm). Good enough to rank chunks for retrieval;
//! not a semantic model.

// ─────────────────────────────────────────────
// Preprocessing
// ─────────────────────────────────────────────

/// English stopwords dropped before hashing.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "had", "has", "have",
    "he", "her", "his", "i", "if", "in", "into", "is", "it", "its", "no", "not", "of", "on", "or",
    "she", "so", "such", "that", "the", "their", "then", "there", "these", "they", "this", "to",
    "was", "we", "were", "what", "when", "which", "who", "will", "with", "you", "your",
];

/// Lowercase, strip punctuation, drop stopwords.
fn preprocess(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .filter(|word| !word.is_empty() && !STOPWORDS.contains(&word.as_str()))
        .collect()
}

/// FNV-1a, 64-bit. Stable across builds and platforms, unlike the std
/// hasher.
fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

// ─────────────────────────────────────────────
// Embedding
// ─────────────────────────────────────────────

/// Dimension of the local embedding (matches the common hosted model size so
/// vectors are interchangeable in storage).
pub const EMBEDDING_DIM: usize = 1536;

/// How many vector positions each word contributes to.
const POSITIONS_PER_WORD: usize = 10;

/// Embed `text` into a unit-length vector.
///
/// Each surviving word scatters weight over ten hashed positions; the result
/// is normalized, so an all-stopword input yields the zero vector.
pub fn local_embedding(text: &str) -> Vec<f32> {
    let mut embedding = vec![0.0f64; EMBEDDING_DIM];

    for word in preprocess(text) {
        let word_hash = fnv1a64(word.as_bytes()) as f64;
        for i in 0..POSITIONS_PER_WORD {
            let position = (fnv1a64(format!("{word}{i}").as_bytes()) as usize) % EMBEDDING_DIM;
            let value = (word_hash * (i + 1) as f64) / 1e19;
            embedding[position] += value;
        }
    }

    let norm = embedding.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in &mut embedding {
            *value /= norm;
        }
    }
    embedding.into_iter().map(|v| v as f32).collect()
}

/// Cosine similarity between two vectors. Zero for mismatched lengths or
/// zero-norm inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// ─────────────────────────────────────────────
// Ranking
// ─────────────────────────────────────────────

/// A chunk scored against a query embedding.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoredChunk {
    pub content: String,
    pub similarity: f32,
}

/// Rank `chunks` (content, embedding) against the query, best first, keeping
/// the top `k`.
pub fn rank_chunks(query: &[f32], chunks: &[(String, Vec<f32>)], k: usize) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .map(|(content, embedding)| ScoredChunk {
            content: content.clone(),
            similarity: cosine_similarity(query, embedding),
        })
        .collect();
    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);
    scored
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
