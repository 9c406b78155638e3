//! Core types shared across the embedding pipeline

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A unit of text awaiting vectorization.
///
/// Immutable once created; the `id` is preserved end to end so callers can
/// correlate vectors back to their inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier correlating this chunk with its vector.
    pub id: String,
    /// Text content to vectorize.
    pub content: String,
}

impl Chunk {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// A chunk id paired with its embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkVector {
    /// Id of the chunk this vector was computed from.
    pub chunk_id: String,
    /// Fixed-dimension embedding; the dimension is constant for one model
    /// instance.
    pub vector: Vec<f32>,
}

/// Payload submitted to a vectorization endpoint for one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// Identifier of the batch this request carries.
    pub batch_id: String,
    /// Chunks to vectorize.
    pub chunks: Vec<Chunk>,
}

/// Payload returned by a vectorization endpoint for one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    /// Identifier of the batch this response answers.
    pub batch_id: String,
    /// One vector per chunk that was embedded.
    pub vectors: Vec<ChunkVector>,
}

/// Chunk ids that received no vector, in input order.
///
/// Partial failure is a normal orchestration outcome; callers reconcile the
/// returned vectors against their inputs to decide what still needs
/// embedding.
pub fn missing_chunk_ids(chunks: &[Chunk], vectors: &[ChunkVector]) -> Vec<String> {
    let embedded: HashSet<&str> = vectors.iter().map(|v| v.chunk_id.as_str()).collect();
    chunks
        .iter()
        .filter(|chunk| !embedded.contains(chunk.id.as_str()))
        .map(|chunk| chunk.id.clone())
        .collect()
}
