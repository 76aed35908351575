//! Core data types shared across the chunking pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chunking::tokenizer;

/// A tokenized sentence with its location in the source text.
///
/// Sentences are immutable once produced by a segmenter. `token_count` is the
/// whitespace-delimited word count, a deliberately simple proxy that stays
/// reproducible across tokenizer implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub text: String,
    /// Byte offset of the first character in the source text.
    pub start_offset: usize,
    /// Byte offset one past the last character in the source text.
    pub end_offset: usize,
    pub token_count: usize,
}

impl Sentence {
    /// Creates a sentence, deriving its token count from the text.
    pub fn new(text: impl Into<String>, start_offset: usize, end_offset: usize) -> Self {
        let text = text.into();
        let token_count = tokenizer::count_tokens(&text);
        Self {
            text,
            start_offset,
            end_offset,
            token_count,
        }
    }
}

/// A structural marker in the source text.
///
/// Boundaries are ordered by `char_offset`, strictly increasing. The detector
/// always emits a synthetic boundary at offset 0 and one at end of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionBoundary {
    pub char_offset: usize,
    pub label: String,
}

/// Assembler output for one chunk, before document-level finalization.
///
/// The leading `overlap_len` sentences are duplicated from the previous chunk
/// so that adjacent chunks share context; [`own_sentences`](Self::own_sentences)
/// yields the remainder, and concatenating every draft's own sentences in
/// order reproduces the original sentence sequence exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDraft {
    pub sentences: Vec<Sentence>,
    /// Count of leading sentences seeded from the previous chunk.
    pub overlap_len: usize,
    pub section_label: String,
}

impl ChunkDraft {
    /// The chunk text: its sentences joined by single spaces.
    pub fn text(&self) -> String {
        self.sentences
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Total token count across all sentences, overlap seed included.
    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(|s| s.token_count).sum()
    }

    /// Sentences owned by this chunk once the overlap seed is dropped.
    pub fn own_sentences(&self) -> &[Sentence] {
        &self.sentences[self.overlap_len..]
    }
}

/// A finalized chunk with its position metadata.
///
/// `chunk_index` is 0-based and dense; `total_chunks` is only known once the
/// whole document has been assembled (and deduplicated), so chunks are built
/// from drafts in a final pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub text: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub token_count: usize,
    pub section_label: String,
    pub is_first: bool,
    pub is_last: bool,
}

impl Chunk {
    /// Finalizes a draft at the given position within the document.
    pub fn from_draft(draft: &ChunkDraft, chunk_index: usize, total_chunks: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: draft.text(),
            chunk_index,
            total_chunks,
            token_count: draft.token_count(),
            section_label: draft.section_label.clone(),
            is_first: chunk_index == 0,
            is_last: chunk_index + 1 == total_chunks,
        }
    }
}

/// Summary statistics for one chunking run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkingStats {
    pub total_sentences: usize,
    pub total_chunks: usize,
    pub average_tokens: f64,
}

/// The surviving chunks of one document plus run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingOutcome {
    pub chunks: Vec<Chunk>,
    pub stats: ChunkingStats,
}

/// Errors raised by the chunking components.
#[derive(Debug, thiserror::Error)]
pub enum ChunkingError {
    /// Bad parameters, rejected before any processing work begins.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A sentence segmenter failed; recovered locally via the regex fallback.
    #[error("sentence segmentation failed: {0}")]
    Segmentation(String),

    /// The embedding provider failed or returned malformed vectors.
    #[error("embedding failed: {0}")]
    Embedding(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(text: &str) -> Sentence {
        Sentence::new(text, 0, text.len())
    }

    #[test]
    fn sentence_derives_token_count() {
        let s = Sentence::new("alpha beta gamma", 10, 26);
        assert_eq!(s.token_count, 3);
        assert_eq!(s.start_offset, 10);
        assert_eq!(s.end_offset, 26);
    }

    #[test]
    fn draft_text_joins_sentences() {
        let draft = ChunkDraft {
            sentences: vec![sentence("One two."), sentence("Three four.")],
            overlap_len: 1,
            section_label: "Start".to_string(),
        };
        assert_eq!(draft.text(), "One two. Three four.");
        assert_eq!(draft.token_count(), 4);
        assert_eq!(draft.own_sentences(), &[sentence("Three four.")]);
    }

    #[test]
    fn chunk_finalization_sets_position_flags() {
        let draft = ChunkDraft {
            sentences: vec![sentence("Only one.")],
            overlap_len: 0,
            section_label: "Start".to_string(),
        };
        let first = Chunk::from_draft(&draft, 0, 3);
        let last = Chunk::from_draft(&draft, 2, 3);
        assert!(first.is_first && !first.is_last);
        assert!(!last.is_first && last.is_last);
        assert_eq!(first.total_chunks, 3);
    }
}
