//! Chunk assembly.
//!
//! A single forward pass folds sentences into size-bounded, overlap-linked
//! chunks. Every sentence is visited once; the break policy is an explicit
//! decision table ([`BreakDecision`]) so the interaction between size limits,
//! section boundaries, punctuation breaks, and minimum-size suppression stays
//! auditable and testable in isolation.

use tracing::warn;

use crate::chunking::boundaries::START_LABEL;
use crate::chunking::tokenizer;
use crate::chunking::types::{ChunkDraft, ChunkingError, SectionBoundary, Sentence};

/// Section label of the degenerate single chunk covering a whole document.
pub const FULL_DOCUMENT_LABEL: &str = "Full Document";

/// Why the current chunk closes before a sentence is admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// Admit the sentence into the current chunk.
    None,
    /// Admitting the sentence would exceed `max_size`; closes even a chunk
    /// still below `min_size`.
    Overflow,
    /// The sentence crossed a section boundary with the chunk at or past
    /// `target_size`; the hard boundary wins over minimum-size suppression.
    SectionBreak,
    /// The chunk is at or past `target_size` and the sentence ends on
    /// terminal punctuation; suppressed while the chunk is below `min_size`.
    NaturalBreak,
}

/// Structure-aware chunk assembler.
///
/// Derived bounds: `min_size = target * (100 - flexibility) / 100` and
/// `max_size = target * (100 + flexibility) / 100`, integer truncation.
#[derive(Debug, Clone)]
pub struct ChunkAssembler {
    target_size: usize,
    overlap: usize,
    min_size: usize,
    max_size: usize,
}

impl ChunkAssembler {
    /// Validates the size parameters and derives the flexible bounds.
    pub fn new(
        target_size: usize,
        overlap: usize,
        flexibility_percent: u32,
    ) -> Result<Self, ChunkingError> {
        if target_size == 0 {
            return Err(ChunkingError::InvalidConfig(
                "target chunk size must be positive".to_string(),
            ));
        }
        if overlap >= target_size {
            return Err(ChunkingError::InvalidConfig(format!(
                "overlap ({overlap}) must be less than target chunk size ({target_size})"
            )));
        }
        if flexibility_percent > 100 {
            return Err(ChunkingError::InvalidConfig(format!(
                "flexibility must be between 0 and 100 percent, got {flexibility_percent}"
            )));
        }
        let flexibility = flexibility_percent as usize;
        Ok(Self {
            target_size,
            overlap,
            min_size: target_size * (100 - flexibility) / 100,
            max_size: target_size * (100 + flexibility) / 100,
        })
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Folds `sentences` into chunks, respecting `boundaries`.
    ///
    /// Boundaries must be ordered by offset. A document whose total token
    /// count fits within `max_size` short-circuits into one chunk labeled
    /// [`FULL_DOCUMENT_LABEL`].
    pub fn assemble(
        &self,
        sentences: &[Sentence],
        boundaries: &[SectionBoundary],
    ) -> Vec<ChunkDraft> {
        if sentences.is_empty() {
            return Vec::new();
        }

        let total = tokenizer::total_tokens(sentences);
        if total <= self.max_size {
            return vec![ChunkDraft {
                sentences: sentences.to_vec(),
                overlap_len: 0,
                section_label: FULL_DOCUMENT_LABEL.to_string(),
            }];
        }

        let mut drafts: Vec<ChunkDraft> = Vec::new();
        let mut current: Vec<Sentence> = Vec::new();
        let mut overlap_len = 0usize;
        let mut current_size = 0usize;
        let mut cursor = BoundaryCursor::new(boundaries);
        let mut current_section = cursor.label().to_string();
        let mut chunk_section = current_section.clone();

        for sentence in sentences {
            let at_boundary = cursor.advance_to(sentence.start_offset);
            if at_boundary {
                current_section = cursor.label().to_string();
            }

            if sentence.token_count > self.max_size {
                if !current.is_empty() {
                    drafts.push(ChunkDraft {
                        sentences: std::mem::take(&mut current),
                        overlap_len,
                        section_label: chunk_section.clone(),
                    });
                }
                self.split_oversized(sentence, &current_section, &mut drafts);
                overlap_len = 0;
                current_size = 0;
                chunk_section = current_section.clone();
                continue;
            }

            let new_size = current_size + sentence.token_count;
            let seed_only = current.len() == overlap_len;
            let decision = self.decide(
                current_size,
                new_size,
                at_boundary,
                ends_on_break(&sentence.text),
                seed_only,
            );
            if decision != BreakDecision::None {
                let closed = ChunkDraft {
                    sentences: std::mem::take(&mut current),
                    overlap_len,
                    section_label: chunk_section.clone(),
                };
                current = self.overlap_seed(&closed.sentences);
                overlap_len = current.len();
                current_size = tokenizer::total_tokens(&current);
                chunk_section = current_section.clone();
                drafts.push(closed);
            }
            if current.is_empty() {
                chunk_section = current_section.clone();
            }
            current.push(sentence.clone());
            current_size += sentence.token_count;
        }

        if current.len() > overlap_len {
            drafts.push(ChunkDraft {
                sentences: current,
                overlap_len,
                section_label: chunk_section,
            });
        }

        if drafts.len() <= 1 {
            warn!(
                total_tokens = total,
                max_size = self.max_size,
                chunks = drafts.len(),
                "assembly produced a single chunk for a document larger than max_size"
            );
        }
        drafts
    }

    /// The per-sentence break policy, evaluated before the sentence is
    /// admitted. `current_size` excludes the sentence, `new_size` includes it.
    ///
    /// A chunk holding nothing beyond its overlap seed always admits the next
    /// sentence; without that rule a sentence near `max_size` could close the
    /// same seed-only chunk forever.
    pub fn decide(
        &self,
        current_size: usize,
        new_size: usize,
        at_boundary: bool,
        good_break: bool,
        seed_only: bool,
    ) -> BreakDecision {
        if seed_only {
            return BreakDecision::None;
        }
        if new_size > self.max_size {
            return BreakDecision::Overflow;
        }
        if new_size >= self.target_size && at_boundary {
            return BreakDecision::SectionBreak;
        }
        if new_size >= self.target_size && good_break && current_size >= self.min_size {
            return BreakDecision::NaturalBreak;
        }
        BreakDecision::None
    }

    /// Trailing whole sentences of `sentences` whose cumulative token count
    /// fits the overlap budget. Never splits a sentence.
    fn overlap_seed(&self, sentences: &[Sentence]) -> Vec<Sentence> {
        if self.overlap == 0 {
            return Vec::new();
        }
        let mut seed: Vec<Sentence> = Vec::new();
        let mut budget = 0usize;
        for sentence in sentences.iter().rev() {
            if budget + sentence.token_count > self.overlap {
                break;
            }
            budget += sentence.token_count;
            seed.push(sentence.clone());
        }
        seed.reverse();
        seed
    }

    /// Force-splits a sentence larger than `max_size` into token windows of
    /// `max_size` with stride `max_size - overlap` (at least 1, so the split
    /// always terminates). Each window becomes its own chunk; the windows
    /// overlap at token level rather than sentence level, so their
    /// `overlap_len` stays 0.
    fn split_oversized(
        &self,
        sentence: &Sentence,
        section_label: &str,
        drafts: &mut Vec<ChunkDraft>,
    ) {
        let tokens: Vec<&str> = sentence.text.split_whitespace().collect();
        let stride = (self.max_size - self.overlap).max(1);
        let mut start = 0usize;
        while start < tokens.len() {
            let end = (start + self.max_size).min(tokens.len());
            let window = tokens[start..end].join(" ");
            drafts.push(ChunkDraft {
                sentences: vec![Sentence::new(
                    window,
                    sentence.start_offset,
                    sentence.end_offset,
                )],
                overlap_len: 0,
                section_label: section_label.to_string(),
            });
            if end == tokens.len() {
                break;
            }
            start += stride;
        }
    }
}

fn ends_on_break(text: &str) -> bool {
    text.trim_end().ends_with(['.', '!', '?', ':', ';'])
}

/// Monotone cursor over the ordered boundary list.
struct BoundaryCursor<'a> {
    boundaries: &'a [SectionBoundary],
    next: usize,
    label: &'a str,
}

impl<'a> BoundaryCursor<'a> {
    fn new(boundaries: &'a [SectionBoundary]) -> Self {
        Self {
            boundaries,
            next: 0,
            label: START_LABEL,
        }
    }

    /// Consumes every boundary at or before `offset`; returns whether any
    /// were crossed.
    fn advance_to(&mut self, offset: usize) -> bool {
        let mut crossed = false;
        while let Some(boundary) = self.boundaries.get(self.next) {
            if boundary.char_offset > offset {
                break;
            }
            self.label = &boundary.label;
            self.next += 1;
            crossed = true;
        }
        crossed
    }

    fn label(&self) -> &str {
        self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::boundaries;

    /// Builds sentences laid out back to back in a synthetic source text.
    fn sentences_from(texts: &[&str]) -> Vec<Sentence> {
        let mut out = Vec::new();
        let mut offset = 0usize;
        for text in texts {
            out.push(Sentence::new(*text, offset, offset + text.len()));
            offset += text.len() + 1;
        }
        out
    }

    fn source_len(sentences: &[Sentence]) -> usize {
        sentences.last().map(|s| s.end_offset).unwrap_or(0)
    }

    fn no_structure(sentences: &[Sentence]) -> Vec<SectionBoundary> {
        vec![
            SectionBoundary {
                char_offset: 0,
                label: START_LABEL.to_string(),
            },
            SectionBoundary {
                char_offset: source_len(sentences),
                label: boundaries::END_LABEL.to_string(),
            },
        ]
    }

    #[test]
    fn document_fitting_max_size_yields_single_chunk() {
        let sentences = sentences_from(&["One two three.", "Four five six."]);
        let assembler = ChunkAssembler::new(10, 2, 0).unwrap();
        let drafts = assembler.assemble(&sentences, &no_structure(&sentences));
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].section_label, FULL_DOCUMENT_LABEL);
        assert_eq!(drafts[0].overlap_len, 0);
        assert_eq!(drafts[0].token_count(), 6);
    }

    #[test]
    fn three_sentences_split_into_two_chunks() {
        // target 8, overlap 2, flexibility 0: the first two four-token
        // sentences fill a chunk exactly; the trailing sentence cannot carry
        // a whole-sentence overlap seed because four tokens exceed the
        // two-token budget.
        let sentences = sentences_from(&[
            "Sentence one here now.",
            "Sentence two here now.",
            "Sentence three here now.",
        ]);
        let assembler = ChunkAssembler::new(8, 2, 0).unwrap();
        let drafts = assembler.assemble(&sentences, &no_structure(&sentences));
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].sentences.len(), 2);
        assert_eq!(drafts[0].token_count(), 8);
        assert_eq!(drafts[1].overlap_len, 0);
        assert_eq!(drafts[1].sentences, &sentences[2..]);
    }

    #[test]
    fn overlap_seed_is_whole_trailing_sentences() {
        let sentences = sentences_from(&[
            "Alpha beta.",
            "Gamma delta.",
            "Epsilon zeta.",
            "Eta theta.",
            "Iota kappa.",
        ]);
        let assembler = ChunkAssembler::new(6, 2, 0).unwrap();
        let drafts = assembler.assemble(&sentences, &no_structure(&sentences));
        assert!(drafts.len() >= 2);
        for pair in drafts.windows(2) {
            let seed = &pair[1].sentences[..pair[1].overlap_len];
            let prev = &pair[0].sentences;
            assert!(seed.len() <= prev.len());
            assert_eq!(&prev[prev.len() - seed.len()..], seed);
            let seed_tokens: usize = seed.iter().map(|s| s.token_count).sum();
            assert!(seed_tokens <= 2);
        }
        assert_eq!(drafts[1].overlap_len, 1);
    }

    #[test]
    fn own_sentences_reconstruct_the_document() {
        let sentences = sentences_from(&[
            "First sentence with several words inside.",
            "Second one follows on directly.",
            "Third keeps the stream going today.",
            "Fourth adds some more material here.",
            "Fifth closes out the little document.",
        ]);
        let assembler = ChunkAssembler::new(10, 4, 20).unwrap();
        let drafts = assembler.assemble(&sentences, &no_structure(&sentences));
        let rebuilt: Vec<Sentence> = drafts
            .iter()
            .flat_map(|d| d.own_sentences().iter().cloned())
            .collect();
        assert_eq!(rebuilt, sentences);
    }

    #[test]
    fn section_boundary_forces_break_once_target_reached() {
        // No terminal punctuation, so only the boundary can close the chunk.
        let sentences = sentences_from(&[
            "Intro sentence number one",
            "Intro sentence number two",
            "Methods sentence number one",
            "Methods sentence number two",
        ]);
        // Boundary right where the third sentence starts.
        let mut bounds = no_structure(&sentences);
        bounds.insert(
            1,
            SectionBoundary {
                char_offset: sentences[2].start_offset,
                label: "Methods".to_string(),
            },
        );
        // target 8, max 12: the two intro sentences reach the target, and the
        // crossed boundary closes the chunk before the methods sentences even
        // though max_size has not been hit.
        let assembler = ChunkAssembler::new(8, 0, 50).unwrap();
        let drafts = assembler.assemble(&sentences, &bounds);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].sentences, &sentences[..2]);
        assert_eq!(drafts[0].section_label, START_LABEL);
        assert_eq!(drafts[1].sentences, &sentences[2..]);
        assert_eq!(drafts[1].section_label, "Methods");
    }

    #[test]
    fn oversized_sentence_splits_into_strided_windows() {
        let words: Vec<String> = (0..25).map(|i| format!("w{i}")).collect();
        let long = words.join(" ");
        let sentences = sentences_from(&[long.as_str()]);
        let assembler = ChunkAssembler::new(8, 2, 0).unwrap();
        let drafts = assembler.assemble(&sentences, &no_structure(&sentences));
        // stride = 8 - 2 = 6: windows at 0, 6, 12, 18.
        assert_eq!(drafts.len(), 4);
        for draft in &drafts {
            assert!(draft.token_count() <= 8);
            assert_eq!(draft.overlap_len, 0);
        }
        assert!(drafts[0].text().starts_with("w0 "));
        assert!(drafts[1].text().starts_with("w6 "));
        assert!(drafts[3].text().ends_with("w24"));
    }

    #[test]
    fn oversized_split_terminates_with_maximal_overlap() {
        let words: Vec<String> = (0..10).map(|i| format!("t{i}")).collect();
        let long = words.join(" ");
        let sentences = sentences_from(&[long.as_str()]);
        // overlap 7 of target 8 leaves stride 1.
        let assembler = ChunkAssembler::new(8, 7, 0).unwrap();
        let drafts = assembler.assemble(&sentences, &no_structure(&sentences));
        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].token_count(), 8);
        assert_eq!(drafts[2].token_count(), 8);
    }

    #[test]
    fn oversized_sentence_flushes_accumulated_chunk_first() {
        let words: Vec<String> = (0..12).map(|i| format!("x{i}")).collect();
        let long = words.join(" ");
        let sentences = sentences_from(&["Short lead in.", long.as_str(), "Short tail out."]);
        let assembler = ChunkAssembler::new(8, 0, 0).unwrap();
        let drafts = assembler.assemble(&sentences, &no_structure(&sentences));
        assert_eq!(drafts[0].sentences.len(), 1);
        assert_eq!(drafts[0].text(), "Short lead in.");
        // Two forced windows of the long sentence, then the tail.
        assert_eq!(drafts.len(), 4);
        assert_eq!(drafts[3].text(), "Short tail out.");
    }

    #[test]
    fn below_min_chunk_never_closes_on_punctuation_alone() {
        // flexibility 0 means min == target == max: a natural break at
        // new_size == target would close a 4-token chunk below min, so it is
        // suppressed and the chunk fills to capacity instead.
        let assembler = ChunkAssembler::new(8, 2, 0).unwrap();
        assert_eq!(
            assembler.decide(4, 8, false, true, false),
            BreakDecision::None
        );
        // With room below target (flexibility 50: min 4), the same shape
        // closes cleanly.
        let flexible = ChunkAssembler::new(8, 2, 50).unwrap();
        assert_eq!(
            flexible.decide(4, 8, false, true, false),
            BreakDecision::NaturalBreak
        );
    }

    #[test]
    fn decision_table_precedence() {
        let assembler = ChunkAssembler::new(10, 2, 50).unwrap();
        // min 5, max 15.
        assert_eq!(
            assembler.decide(12, 16, true, true, false),
            BreakDecision::Overflow
        );
        assert_eq!(
            assembler.decide(8, 12, true, true, false),
            BreakDecision::SectionBreak
        );
        assert_eq!(
            assembler.decide(8, 12, false, true, false),
            BreakDecision::NaturalBreak
        );
        assert_eq!(
            assembler.decide(8, 12, false, false, false),
            BreakDecision::None
        );
        // Below target: nothing closes the chunk.
        assert_eq!(
            assembler.decide(4, 8, true, true, false),
            BreakDecision::None
        );
        // A hard boundary closes even a below-min chunk once target is met.
        assert_eq!(
            assembler.decide(4, 10, true, true, false),
            BreakDecision::SectionBreak
        );
        // A seed-only chunk always admits the sentence.
        assert_eq!(
            assembler.decide(12, 16, true, true, true),
            BreakDecision::None
        );
    }

    #[test]
    fn parameter_validation() {
        assert!(matches!(
            ChunkAssembler::new(0, 0, 0),
            Err(ChunkingError::InvalidConfig(_))
        ));
        assert!(matches!(
            ChunkAssembler::new(10, 10, 0),
            Err(ChunkingError::InvalidConfig(_))
        ));
        assert!(matches!(
            ChunkAssembler::new(10, 2, 101),
            Err(ChunkingError::InvalidConfig(_))
        ));
        let assembler = ChunkAssembler::new(10, 2, 30).unwrap();
        assert_eq!(assembler.min_size(), 7);
        assert_eq!(assembler.max_size(), 13);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let assembler = ChunkAssembler::new(10, 2, 0).unwrap();
        assert!(assembler.assemble(&[], &[]).is_empty());
    }
}
