//! Stage-level progress reporting for pipeline runs.
//!
//! The pipeline reports coarse progress to a [`ProgressSink`] so callers can
//! drive UI or logging without the core knowing anything about either.
//! [`NoopProgress`] is the default; [`TracingProgress`] forwards updates to
//! `tracing`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Boundaries,
    Segmentation,
    Assembly,
    Deduplication,
    Metadata,
}

impl PipelineStage {
    /// All stages in execution order.
    pub const ALL: [PipelineStage; 5] = [
        PipelineStage::Boundaries,
        PipelineStage::Segmentation,
        PipelineStage::Assembly,
        PipelineStage::Deduplication,
        PipelineStage::Metadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Boundaries => "boundaries",
            PipelineStage::Segmentation => "segmentation",
            PipelineStage::Assembly => "assembly",
            PipelineStage::Deduplication => "deduplication",
            PipelineStage::Metadata => "metadata",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: PipelineStage,
    /// Stages completed before this one.
    pub completed: usize,
    /// Total number of stages in the run.
    pub total: usize,
    pub detail: String,
}

/// Receives progress updates from the pipeline.
pub trait ProgressSink: Send + Sync {
    fn on_update(&self, update: &ProgressUpdate);
}

/// Discards all updates; the default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_update(&self, _update: &ProgressUpdate) {}
}

/// Forwards updates to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn on_update(&self, update: &ProgressUpdate) {
        debug!(
            stage = %update.stage,
            completed = update.completed,
            total = update.total,
            detail = %update.detail,
            "pipeline progress"
        );
    }
}
