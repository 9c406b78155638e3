//! Shared data model for EmbedFlow
//!
//! Types exchanged between the batch controller and the job orchestrator:
//! chunks awaiting vectorization, their embedding vectors, and the wire
//! envelopes carried to a vectorization endpoint.

pub mod types;

pub use types::{missing_chunk_ids, Chunk, ChunkVector, EmbedRequest, EmbedResponse};
