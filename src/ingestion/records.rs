//! Conversion of chunking outcomes into storage-ready records.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chunking::types::{Chunk, ChunkingOutcome};

/// A chunk plus its metadata map, ready for the embedding-and-storage stage.
///
/// This is a backend-agnostic representation; downstream vector stores
/// convert it into whatever document shape they persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique identifier for this chunk.
    pub id: String,
    /// Source document path, URL, or name.
    pub source: String,
    /// Section context for the chunk.
    pub section: String,
    /// Zero-based index of this chunk within the surviving set.
    pub chunk_index: usize,
    /// The actual text content.
    pub content: String,
    /// Caller-supplied metadata merged with derived fields, as JSON.
    pub metadata: Value,
}

/// Derived position of a chunk within its document.
fn position(chunk: &Chunk) -> &'static str {
    if chunk.is_first {
        "beginning"
    } else if chunk.is_last {
        "end"
    } else {
        "middle"
    }
}

/// Builds one record per surviving chunk.
///
/// Derived fields (`position`, `content_length`, `created_at`, `section`,
/// `token_count`, `chunk_index`, `total_chunks`) are written over a copy of
/// the caller's metadata, so a caller key of the same name is replaced.
pub fn outcome_to_records(
    outcome: &ChunkingOutcome,
    source: &str,
    base_metadata: &Map<String, Value>,
) -> Vec<ChunkRecord> {
    let created_at = Utc::now().to_rfc3339();
    outcome
        .chunks
        .iter()
        .map(|chunk| {
            let mut metadata = base_metadata.clone();
            metadata.insert("chunk_index".to_string(), Value::from(chunk.chunk_index));
            metadata.insert("total_chunks".to_string(), Value::from(chunk.total_chunks));
            metadata.insert("token_count".to_string(), Value::from(chunk.token_count));
            metadata.insert(
                "section".to_string(),
                Value::from(chunk.section_label.clone()),
            );
            metadata.insert("position".to_string(), Value::from(position(chunk)));
            metadata.insert(
                "content_length".to_string(),
                Value::from(chunk.text.len()),
            );
            metadata.insert("created_at".to_string(), Value::from(created_at.clone()));
            ChunkRecord {
                id: chunk.id.to_string(),
                source: source.to_string(),
                section: chunk.section_label.clone(),
                chunk_index: chunk.chunk_index,
                content: chunk.text.clone(),
                metadata: Value::Object(metadata),
            }
        })
        .collect()
}
