//! Token counting.
//!
//! All sizes in the pipeline are measured in whitespace-delimited words. This
//! is a coarse proxy for model tokens, chosen because it is reproducible and
//! independent of any embedding model's vocabulary.

use crate::chunking::types::Sentence;

/// Number of whitespace-delimited tokens in `text`.
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Sum of the token counts of `sentences`.
pub fn total_tokens(sentences: &[Sentence]) -> usize {
    sentences.iter().map(|s| s.token_count).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_whitespace_delimited_words() {
        assert_eq!(count_tokens("one two three"), 3);
        assert_eq!(count_tokens("  padded   spacing\tand\nnewlines "), 4);
        assert_eq!(count_tokens(""), 0);
        assert_eq!(count_tokens("   "), 0);
    }

    #[test]
    fn punctuation_stays_attached_to_words() {
        assert_eq!(count_tokens("Hello, world!"), 2);
    }

    #[test]
    fn totals_across_sentences() {
        let sentences = vec![
            Sentence::new("one two", 0, 7),
            Sentence::new("three four five", 8, 23),
        ];
        assert_eq!(total_tokens(&sentences), 5);
        assert_eq!(total_tokens(&[]), 0);
    }
}
