//! Pipeline orchestration.
//!
//! [`ChunkingService`] sequences boundary detection, sentence segmentation,
//! chunk assembly, deduplication, and metadata attachment for one document
//! per call. Every call is pure with respect to its inputs: the service
//! holds no per-document state, so independent documents can be processed
//! from parallel tasks. A stage failure aborts the whole document; partial
//! output is never returned.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::chunking::assembly::ChunkAssembler;
use crate::chunking::boundaries;
use crate::chunking::config::ChunkingConfig;
use crate::chunking::dedup::{self, DedupOutcome};
use crate::chunking::embeddings::EmbeddingProvider;
use crate::chunking::segmenter::{self, SentenceSegmenter, UnicodeSegmenter};
use crate::chunking::types::{Chunk, ChunkingOutcome, ChunkingStats};
use crate::ingestion::records::{self, ChunkRecord};
use crate::progress::{NoopProgress, PipelineStage, ProgressSink, ProgressUpdate};
use crate::types::PipelineError;

/// Request for processing one document through the pipeline.
///
/// The text is expected to be cleaned already; cleaning and file-format
/// extraction happen upstream.
#[derive(Debug, Clone)]
pub struct ProcessDocumentRequest {
    pub text: String,
    /// Source path, URL, or name recorded on every chunk record.
    pub source: String,
    /// Caller metadata copied onto every chunk record.
    pub metadata: Map<String, Value>,
    /// Per-request configuration override.
    pub config: Option<ChunkingConfig>,
}

impl ProcessDocumentRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: String::new(),
            metadata: Map::new(),
            config: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: ChunkingConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// Telemetry for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineTelemetry {
    /// Name of the embedding provider used for deduplication.
    pub embedder: String,
    pub duration_ms: u64,
    /// Whether the regex fallback segmenter was used.
    pub fallback_used: bool,
    pub sentence_count: usize,
    pub boundary_count: usize,
    pub chunks_before_dedup: usize,
    /// Surviving chunk count after deduplication.
    pub chunk_count: usize,
    pub average_tokens: f64,
}

/// Everything produced for one document.
#[derive(Debug, Clone)]
pub struct ProcessDocumentResponse {
    /// Storage-ready records for the surviving chunks, in order.
    pub records: Vec<ChunkRecord>,
    pub outcome: ChunkingOutcome,
    pub dedup: DedupOutcome,
    pub telemetry: PipelineTelemetry,
}

/// The segmentation-and-deduplication pipeline service.
pub struct ChunkingService {
    embedder: Arc<dyn EmbeddingProvider>,
    segmenter: Arc<dyn SentenceSegmenter>,
    config: ChunkingConfig,
    progress: Arc<dyn ProgressSink>,
}

impl ChunkingService {
    /// Create a new builder for constructing a `ChunkingService`.
    pub fn builder() -> ChunkingServiceBuilder {
        ChunkingServiceBuilder::default()
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Runs the full pipeline over one document.
    pub async fn process_document(
        &self,
        request: ProcessDocumentRequest,
    ) -> Result<ProcessDocumentResponse, PipelineError> {
        let started = Instant::now();
        let config = request.config.as_ref().unwrap_or(&self.config);
        config
            .validate()
            .map_err(|err| PipelineError::Validation(err.to_string()))?;

        let total_stages = PipelineStage::ALL.len();
        self.report(PipelineStage::Boundaries, 0, total_stages, "detecting section boundaries");
        let bounds = if config.respect_document_structure {
            boundaries::detect(&request.text)
        } else {
            boundaries::synthetic(&request.text)
        };

        self.report(PipelineStage::Segmentation, 1, total_stages, "tokenizing sentences");
        let (sentences, fallback_used) =
            segmenter::segment_with_fallback(self.segmenter.as_ref(), &request.text);

        self.report(PipelineStage::Assembly, 2, total_stages, "assembling chunks");
        let assembler = ChunkAssembler::new(
            config.target_chunk_size,
            config.chunk_overlap,
            config.flexibility_percent,
        )
        .map_err(|err| PipelineError::Validation(err.to_string()))?;
        let drafts = assembler.assemble(&sentences, &bounds);

        self.report(PipelineStage::Deduplication, 3, total_stages, "deduplicating chunks");
        let texts: Vec<String> = drafts.iter().map(|draft| draft.text()).collect();
        let dedup_outcome = dedup::deduplicate(
            &texts,
            config.similarity_threshold,
            self.embedder.as_ref(),
        )
        .await
        .map_err(|err| PipelineError::at_stage(PipelineStage::Deduplication, err))?;

        // Indices and position flags are re-derived over the surviving set.
        let total_chunks = dedup_outcome.kept.len();
        let chunks: Vec<Chunk> = dedup_outcome
            .kept
            .iter()
            .enumerate()
            .map(|(index, &draft_index)| Chunk::from_draft(&drafts[draft_index], index, total_chunks))
            .collect();
        let average_tokens = if chunks.is_empty() {
            0.0
        } else {
            chunks.iter().map(|c| c.token_count).sum::<usize>() as f64 / chunks.len() as f64
        };
        let outcome = ChunkingOutcome {
            chunks,
            stats: ChunkingStats {
                total_sentences: sentences.len(),
                total_chunks,
                average_tokens,
            },
        };

        self.report(PipelineStage::Metadata, 4, total_stages, "attaching metadata");
        let chunk_records =
            records::outcome_to_records(&outcome, &request.source, &request.metadata);

        let telemetry = PipelineTelemetry {
            embedder: self.embedder.name().to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
            fallback_used,
            sentence_count: sentences.len(),
            boundary_count: bounds.len(),
            chunks_before_dedup: drafts.len(),
            chunk_count: total_chunks,
            average_tokens,
        };
        info!(
            source = %request.source,
            chunks = telemetry.chunk_count,
            discarded = telemetry.chunks_before_dedup - telemetry.chunk_count,
            duration_ms = telemetry.duration_ms,
            "document processed"
        );

        Ok(ProcessDocumentResponse {
            records: chunk_records,
            outcome,
            dedup: dedup_outcome,
            telemetry,
        })
    }

    fn report(&self, stage: PipelineStage, completed: usize, total: usize, detail: &str) {
        self.progress.on_update(&ProgressUpdate {
            stage,
            completed,
            total,
            detail: detail.to_string(),
        });
    }
}

/// Builder for constructing [`ChunkingService`] instances.
#[derive(Default)]
pub struct ChunkingServiceBuilder {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    segmenter: Option<Arc<dyn SentenceSegmenter>>,
    config: Option<ChunkingConfig>,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl ChunkingServiceBuilder {
    /// Set the embedding provider used for deduplication.
    ///
    /// This is required before calling [`build()`](Self::build).
    #[must_use]
    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(provider);
        self
    }

    /// Set the sentence segmenter. Defaults to [`UnicodeSegmenter`].
    #[must_use]
    pub fn with_segmenter(mut self, segmenter: Arc<dyn SentenceSegmenter>) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    /// Set the default configuration for the service.
    #[must_use]
    pub fn with_config(mut self, config: ChunkingConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the progress sink. Defaults to [`NoopProgress`].
    #[must_use]
    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Build the [`ChunkingService`].
    ///
    /// # Panics
    ///
    /// Panics if no embedding provider was supplied.
    pub fn build(self) -> ChunkingService {
        ChunkingService {
            embedder: self
                .embedder
                .expect("ChunkingServiceBuilder requires an embedding provider"),
            segmenter: self.segmenter.unwrap_or_else(|| Arc::new(UnicodeSegmenter)),
            config: self.config.unwrap_or_default(),
            progress: self.progress.unwrap_or_else(|| Arc::new(NoopProgress)),
        }
    }

    /// Build the [`ChunkingService`], returning `None` if no embedding
    /// provider was supplied.
    pub fn try_build(self) -> Option<ChunkingService> {
        Some(ChunkingService {
            embedder: self.embedder?,
            segmenter: self.segmenter.unwrap_or_else(|| Arc::new(UnicodeSegmenter)),
            config: self.config.unwrap_or_default(),
            progress: self.progress.unwrap_or_else(|| Arc::new(NoopProgress)),
        })
    }
}
