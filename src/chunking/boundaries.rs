//! Section boundary detection over raw document text.
//!
//! The detector is a pure function of the text: it scans line by line for
//! structural markers (numbered headings, known section keywords, ALL-CAPS
//! lines, short Title-Case lines) and records at most one boundary per line,
//! first matching heuristic wins. Offsets are byte offsets computed by
//! summing prior line lengths plus one per newline, so they compare directly
//! against sentence offsets from the segmenter.

use std::sync::LazyLock;

use regex::Regex;

use crate::chunking::types::SectionBoundary;

/// Label of the synthetic boundary at offset 0.
pub const START_LABEL: &str = "Start";
/// Label of the synthetic boundary at end of text.
pub const END_LABEL: &str = "End of Document";

static STRUCTURAL_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^chapter\s+\d+\b",
        r"(?i)^section\s+\d+\b",
        r"(?i)^appendix\s+[a-z0-9]\b",
        r"^\d+(?:\.\d+)*[.)]\s+\S",
        r"(?i)^[ivxlcdm]+[.)]\s+\S",
        r"(?i)^(?:introduction|conclusion|references|bibliography|abstract|summary|acknowledgments)\s*:?\s*$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid boundary regex"))
    .collect()
});

/// Scans `text` for section boundaries.
///
/// The result is ordered by offset, strictly increasing, and always contains
/// the synthetic `Start` and `End of Document` boundaries. A heading on the
/// very first line coincides with the `Start` boundary and is not recorded
/// twice.
pub fn detect(text: &str) -> Vec<SectionBoundary> {
    let mut boundaries = vec![SectionBoundary {
        char_offset: 0,
        label: START_LABEL.to_string(),
    }];

    let mut offset = 0usize;
    for line in text.split('\n') {
        let trimmed = line.trim();
        if let Some(label) = classify_line(trimmed) {
            let line_offset = offset + (line.len() - line.trim_start().len());
            let last_offset = boundaries.last().map(|b| b.char_offset).unwrap_or(0);
            if line_offset > last_offset {
                boundaries.push(SectionBoundary {
                    char_offset: line_offset,
                    label,
                });
            }
        }
        offset += line.len() + 1;
    }

    boundaries.push(SectionBoundary {
        char_offset: text.len(),
        label: END_LABEL.to_string(),
    });
    boundaries
}

/// Only the synthetic boundaries, used when document structure is ignored.
pub fn synthetic(text: &str) -> Vec<SectionBoundary> {
    vec![
        SectionBoundary {
            char_offset: 0,
            label: START_LABEL.to_string(),
        },
        SectionBoundary {
            char_offset: text.len(),
            label: END_LABEL.to_string(),
        },
    ]
}

fn classify_line(line: &str) -> Option<String> {
    if line.is_empty() {
        return None;
    }
    if STRUCTURAL_RES.iter().any(|re| re.is_match(line))
        || is_all_caps_heading(line)
        || is_title_case_heading(line)
    {
        return Some(line.to_string());
    }
    None
}

/// ALL-CAPS line with length in (3, 100) and no digits.
fn is_all_caps_heading(line: &str) -> bool {
    let len = line.chars().count();
    if len <= 3 || len >= 100 {
        return false;
    }
    if line.chars().any(|c| c.is_numeric()) {
        return false;
    }
    line.chars().any(|c| c.is_alphabetic()) && !line.chars().any(|c| c.is_lowercase())
}

/// Title-Case line of at most 7 words, shorter than 60 characters, not ending
/// in terminal punctuation.
fn is_title_case_heading(line: &str) -> bool {
    if line.chars().count() >= 60 {
        return false;
    }
    if line.ends_with(['.', ',', ':', ';', '?', '!']) {
        return false;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() || words.len() > 7 {
        return false;
    }
    words.iter().all(|word| is_title_word(word))
}

fn is_title_word(word: &str) -> bool {
    let mut alphabetic = word.chars().filter(|c| c.is_alphabetic());
    match alphabetic.next() {
        Some(first) if first.is_uppercase() => alphabetic.all(|c| c.is_lowercase()),
        _ => false,
    }
}
