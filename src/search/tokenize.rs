//! Text tokenization and stemming shared by index building and querying.
//!
//! Both sides must produce identical tokens for identical text, so there is exactly one
//! tokenizer and the bundle never stores terms produced any other way.

use rust_stemmers::{Algorithm, Stemmer};
use std::ops::Range;

/// Minimum token length for indexing. Set to 1 to allow short names like `io`, `os`, `x`.
const MIN_TOKEN_LENGTH: usize = 1;

/// Common English stop words to filter out from indexing.
/// These high-frequency words add little value to search relevance.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "will", "with",
];

/// A stemmed term and the byte range of the text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    pub span: Range<usize>,
}

/// English tokenizer with case-aware splitting and Snowball stemming.
pub struct Tokenizer {
    stemmer: Stemmer,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("algorithm", &"english")
            .finish()
    }
}

impl Tokenizer {
    /// Stemmed terms of `text`, in order of appearance.
    pub fn terms(&self, text: &str) -> Vec<String> {
        self.tokens(text).into_iter().map(|t| t.term).collect()
    }

    /// Tokenizes text into searchable terms, keeping where each came from.
    pub fn tokens(&self, text: &str) -> Vec<Token> {
        Self::spans(text)
            .into_iter()
            .filter_map(|span| {
                self.stem(&text[span.clone()])
                    .map(|term| Token { term, span })
            })
            .collect()
    }

    /// Byte ranges of the raw words and sub-words of `text`, before stop-word filtering
    /// and stemming.
    ///
    /// The state machine splits on several boundaries:
    /// - **CamelCase**: "HttpServer" → ["Http", "Server", "HttpServer"]
    /// - **snake_case**: "parse_json" → ["parse", "json"]
    /// - **hyphen-case**: "multi-line" → ["multi", "line"]
    /// - anything else that is not alphanumeric ends the word (`A::B`, `pkg.mod`)
    ///
    /// It maintains two pointers:
    /// - `word_start`: Start of the complete word (e.g., "HttpServer")
    /// - `subword_start`: Start of the current sub-component (e.g., "Server")
    pub fn spans(text: &str) -> Vec<Range<usize>> {
        let mut spans = vec![];

        let mut last_case = None;
        let mut word_start = 0;
        let mut subword_start = 0;
        let mut word_start_next_char = true;
        let mut subword_start_next_char = true;

        for (i, c) in text.char_indices() {
            if word_start_next_char {
                word_start = i;
                subword_start = i;
                word_start_next_char = false;
                subword_start_next_char = false;
            }

            if subword_start_next_char {
                subword_start = i;
                subword_start_next_char = false;
            }

            // Detect case changes for CamelCase splitting (lowercase → uppercase)
            let current_case = c.is_alphabetic().then(|| c.is_uppercase());
            let case_change = last_case == Some(false) && current_case == Some(true);
            last_case = current_case;

            if c == '-' || c == '_' {
                if i.saturating_sub(subword_start) >= MIN_TOKEN_LENGTH {
                    spans.push(subword_start..i);
                }
                subword_start_next_char = true;
            } else if !c.is_alphanumeric() {
                if i.saturating_sub(subword_start) >= MIN_TOKEN_LENGTH
                    && subword_start != word_start
                {
                    spans.push(subword_start..i);
                }
                // "parse_json" was already emitted as its parts
                if i.saturating_sub(word_start) >= MIN_TOKEN_LENGTH
                    && !has_separator(&text[word_start..i])
                {
                    spans.push(word_start..i);
                }
                word_start_next_char = true;
                last_case = None;
            } else if case_change {
                if i.saturating_sub(subword_start) >= MIN_TOKEN_LENGTH {
                    spans.push(subword_start..i);
                }
                subword_start = i;
            }
        }

        if !word_start_next_char {
            let end = text.len();
            if word_start != subword_start && end - subword_start >= MIN_TOKEN_LENGTH {
                spans.push(subword_start..end);
            }
            if end - word_start >= MIN_TOKEN_LENGTH && !has_separator(&text[word_start..end]) {
                spans.push(word_start..end);
            }
        }

        spans
    }

    /// Lowercases and stems one raw word. Stop words yield `None`.
    pub fn stem(&self, word: &str) -> Option<String> {
        let lowercase = word.to_lowercase();
        if STOP_WORDS.contains(&lowercase.as_str()) {
            return None;
        }
        let term = self.stemmer.stem(&lowercase).into_owned();
        (!term.is_empty()).then_some(term)
    }
}

fn has_separator(word: &str) -> bool {
    word.contains(['-', '_'])
}
