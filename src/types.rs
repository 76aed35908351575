//! Crate-wide error types.

use thiserror::Error;

use crate::chunking::types::ChunkingError;
use crate::progress::PipelineStage;

/// The single aggregated per-document failure surfaced by the pipeline.
///
/// The orchestrator aborts a document on the first fatal error and never
/// returns partial output; the variant names which stage failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Parameter validation failed before any processing work began.
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// A pipeline stage failed and the document was aborted.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: ChunkingError,
    },
}

impl PipelineError {
    /// Wraps a component error with the stage it occurred in. Validation
    /// errors keep their own variant so callers can distinguish bad
    /// parameters from runtime failures.
    pub fn at_stage(stage: PipelineStage, source: ChunkingError) -> Self {
        match source {
            ChunkingError::InvalidConfig(message) => PipelineError::Validation(message),
            other => PipelineError::Stage {
                stage,
                source: other,
            },
        }
    }
}
