//! Near-duplicate removal over embedded chunk texts.
//!
//! The absorption rule is a greedy single forward pass over a seen-set, in
//! original chunk order: the first unseen chunk is kept and absorbs every
//! later chunk whose cosine similarity exceeds the threshold (strictly).
//! This is order-dependent and non-transitive on purpose. It is not a
//! clustering algorithm, and two kept chunks may still sit near the
//! threshold through an absorbed intermediate. Keeping the pass explicit
//! makes the output order-reproducible.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunking::embeddings::EmbeddingProvider;
use crate::chunking::types::ChunkingError;

/// Per-chunk outcome of the absorption pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimilarityDecision {
    Kept,
    /// Absorbed into the earlier kept chunk at this index.
    AbsorbedBy(usize),
}

/// Which chunks survive deduplication, in original order.
///
/// Invariant: `kept`, read in order, is exactly the set of indices whose
/// decision is [`SimilarityDecision::Kept`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupOutcome {
    pub kept: Vec<usize>,
    pub decisions: Vec<SimilarityDecision>,
}

/// Collapses near-identical texts using vector-space distance.
///
/// Embeds all texts in one batch call, computes the full pairwise cosine
/// matrix, then runs the greedy absorption pass. The threshold must lie in
/// (0, 1) exclusive and is validated before any embedding work; an empty
/// input produces an empty outcome without calling the embedder.
pub async fn deduplicate(
    texts: &[String],
    threshold: f32,
    embedder: &dyn EmbeddingProvider,
) -> Result<DedupOutcome, ChunkingError> {
    if !(threshold > 0.0 && threshold < 1.0) {
        return Err(ChunkingError::InvalidConfig(format!(
            "similarity threshold must be in (0, 1) exclusive, got {threshold}"
        )));
    }
    if texts.is_empty() {
        return Ok(DedupOutcome::default());
    }

    let embeddings = embedder.embed_batch(texts).await?;
    if embeddings.len() != texts.len() {
        return Err(ChunkingError::Embedding(format!(
            "expected {} vectors, got {}",
            texts.len(),
            embeddings.len()
        )));
    }
    let dimension = embeddings[0].len();
    if embeddings.iter().any(|v| v.len() != dimension) {
        return Err(ChunkingError::Embedding(
            "embedding dimensions differ within one batch".to_string(),
        ));
    }

    let matrix = similarity_matrix(&embeddings);
    let mut decisions = vec![SimilarityDecision::Kept; texts.len()];
    let mut seen = vec![false; texts.len()];
    let mut kept = Vec::new();

    for i in 0..texts.len() {
        if seen[i] {
            continue;
        }
        seen[i] = true;
        kept.push(i);
        for j in (i + 1)..texts.len() {
            if !seen[j] && matrix[i][j] > threshold {
                seen[j] = true;
                decisions[j] = SimilarityDecision::AbsorbedBy(i);
            }
        }
    }

    debug!(
        total = texts.len(),
        kept = kept.len(),
        threshold,
        "deduplication complete"
    );
    Ok(DedupOutcome { kept, decisions })
}

/// Full pairwise cosine similarity matrix; symmetric, diagonal 1.
pub fn similarity_matrix(embeddings: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let n = embeddings.len();
    let mut matrix = vec![vec![0.0f32; n]; n];
    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let similarity = cosine_similarity(&embeddings[i], &embeddings[j]);
            matrix[i][j] = similarity;
            matrix[j][i] = similarity;
        }
    }
    matrix
}

/// Cosine similarity; 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}
