//! Pipeline configuration surface.

use serde::{Deserialize, Serialize};

use crate::chunking::types::ChunkingError;

/// Options recognized by the pipeline, with the defaults the surrounding
/// application ships.
///
/// How the values are loaded (files, environment, UI) is the caller's
/// concern; the struct is serde-derived so any source works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in tokens.
    pub target_chunk_size: usize,
    /// Tokens of context shared between consecutive chunks; must be smaller
    /// than `target_chunk_size`.
    pub chunk_overlap: usize,
    /// How far (in percent of the target) a chunk may deviate from the
    /// target size in either direction.
    pub flexibility_percent: u32,
    /// Cosine similarity above which a chunk is absorbed as a duplicate;
    /// exclusive bounds (0, 1).
    pub similarity_threshold: f32,
    /// When false, section boundary detection is bypassed and only
    /// size/overlap rules apply.
    pub respect_document_structure: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_chunk_size: 400,
            chunk_overlap: 50,
            flexibility_percent: 30,
            similarity_threshold: 0.95,
            respect_document_structure: true,
        }
    }
}

impl ChunkingConfig {
    /// Validates every parameter; called before any processing work begins.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        if self.target_chunk_size == 0 {
            return Err(ChunkingError::InvalidConfig(
                "target_chunk_size must be positive".to_string(),
            ));
        }
        if self.chunk_overlap >= self.target_chunk_size {
            return Err(ChunkingError::InvalidConfig(format!(
                "chunk_overlap ({}) must be less than target_chunk_size ({})",
                self.chunk_overlap, self.target_chunk_size
            )));
        }
        if self.flexibility_percent > 100 {
            return Err(ChunkingError::InvalidConfig(format!(
                "flexibility_percent must be between 0 and 100, got {}",
                self.flexibility_percent
            )));
        }
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold < 1.0) {
            return Err(ChunkingError::InvalidConfig(format!(
                "similarity_threshold must be in (0, 1) exclusive, got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}
