//! Embedding capability consumed by the deduplicator.
//!
//! Embedding is expressed as the narrow [`EmbeddingProvider`] trait so the
//! pipeline never depends on a concrete model stack. Providers must return
//! one fixed-dimension vector per input text and raise on failure; the
//! pipeline does not accept silently degraded vectors.

use async_trait::async_trait;

use crate::chunking::types::ChunkingError;

/// Batch text embedding capability.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds every text, returning one vector per input in the same order.
    /// The vector dimension must be constant within a call.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError>;

    /// Short provider name surfaced in telemetry.
    fn name(&self) -> &'static str;
}

/// Deterministic embedding provider for tests and offline runs.
///
/// Vectors are unit-length and seeded from a hash of the input text:
/// identical texts always produce identical vectors, while distinct texts
/// produce pseudo-random vectors that are nearly orthogonal in expectation.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dimension: 64 }
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut state = fnv1a(text.as_bytes());
        let mut vector = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            state = splitmix64(state);
            // Top 24 bits mapped into [-1, 1).
            vector.push((state >> 40) as f32 / (1u64 << 23) as f32 - 1.0);
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn splitmix64(state: u64) -> u64 {
    let mut z = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embeddings_are_deterministic() {
        let provider = MockEmbeddingProvider::new();
        let inputs = vec![
            "Hello world".to_string(),
            "Goodbye world".to_string(),
            "Hello world".to_string(),
        ];

        let first = provider.embed_batch(&inputs).await.unwrap();
        let second = provider.embed_batch(&inputs).await.unwrap();

        assert_eq!(first, second, "mock embeddings should be deterministic");
        assert_eq!(
            first[0], first[2],
            "identical text should have identical embedding"
        );
        assert_ne!(
            first[0], first[1],
            "different text should have different embeddings"
        );
    }

    #[tokio::test]
    async fn vectors_are_unit_length_with_constant_dimension() {
        let provider = MockEmbeddingProvider::with_dimension(32);
        let inputs = vec!["alpha".to_string(), "beta".to_string()];
        let vectors = provider.embed_batch(&inputs).await.unwrap();
        for vector in &vectors {
            assert_eq!(vector.len(), 32);
            let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4);
        }
    }

    #[tokio::test]
    async fn empty_batch_embeds_to_nothing() {
        let provider = MockEmbeddingProvider::new();
        let vectors = provider.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
