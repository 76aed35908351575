//! Sentence segmentation capability.
//!
//! The pipeline consumes sentence tokenization through the narrow
//! [`SentenceSegmenter`] trait so real NLP tokenizers can be plugged in from
//! outside. Two implementations ship with the crate: [`UnicodeSegmenter`]
//! (UAX #29 sentence boundaries, the default) and [`RegexSegmenter`], the
//! fallback used by [`segment_with_fallback`] when the primary segmenter
//! fails or produces nothing. Segmentation is total from the pipeline's
//! perspective: a non-empty text always yields at least one sentence.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

use crate::chunking::types::{ChunkingError, Sentence};

/// Splits text into ordered sentence spans.
pub trait SentenceSegmenter: Send + Sync {
    fn segment(&self, text: &str) -> Result<Vec<Sentence>, ChunkingError>;

    /// Short segmenter name surfaced in logs and telemetry.
    fn name(&self) -> &'static str;
}

/// Default segmenter based on Unicode sentence boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSegmenter;

impl SentenceSegmenter for UnicodeSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<Sentence>, ChunkingError> {
        let mut sentences = Vec::new();
        for (offset, raw) in text.split_sentence_bound_indices() {
            if let Some(sentence) = trim_span(raw, offset) {
                sentences.push(sentence);
            }
        }
        Ok(sentences)
    }

    fn name(&self) -> &'static str {
        "unicode"
    }
}

static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^.!?]*[.!?]+["')\]]*|[^.!?]+"#).expect("valid sentence regex"));

/// Regex-based splitter used when the primary segmenter fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexSegmenter;

impl SentenceSegmenter for RegexSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<Sentence>, ChunkingError> {
        let mut sentences = Vec::new();
        for m in SENTENCE_RE.find_iter(text) {
            if let Some(sentence) = trim_span(m.as_str(), m.start()) {
                sentences.push(sentence);
            }
        }
        Ok(sentences)
    }

    fn name(&self) -> &'static str {
        "regex-fallback"
    }
}

/// Segments `text` with `primary`, falling back to [`RegexSegmenter`] when it
/// errors or produces no sentences for non-empty text.
///
/// Returns the sentences plus whether the fallback was used. Never fails:
/// if even the fallback yields nothing for a non-empty text, the whole text
/// becomes a single sentence.
pub fn segment_with_fallback(
    primary: &dyn SentenceSegmenter,
    text: &str,
) -> (Vec<Sentence>, bool) {
    match primary.segment(text) {
        Ok(sentences) if !sentences.is_empty() || text.trim().is_empty() => (sentences, false),
        Ok(_) => {
            warn!(
                segmenter = primary.name(),
                "segmenter produced no sentences, using regex fallback"
            );
            (fallback_segment(text), true)
        }
        Err(err) => {
            warn!(
                segmenter = primary.name(),
                error = %err,
                "segmenter failed, using regex fallback"
            );
            (fallback_segment(text), true)
        }
    }
}

fn fallback_segment(text: &str) -> Vec<Sentence> {
    let sentences = RegexSegmenter.segment(text).unwrap_or_default();
    if sentences.is_empty() {
        return trim_span(text, 0).into_iter().collect();
    }
    sentences
}

fn trim_span(raw: &str, offset: usize) -> Option<Sentence> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lead = raw.len() - raw.trim_start().len();
    let start = offset + lead;
    Some(Sentence::new(trimmed, start, start + trimmed.len()))
}
