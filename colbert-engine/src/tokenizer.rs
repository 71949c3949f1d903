//! Whitespace tokenizer
//!
//! Splits text on runs of ASCII whitespace (space, `\t`, `\n`, `\x0B`, `\x0C`,
//! `\r`) and lower-cases each fragment. Unicode spaces such as U+00A0 stay
//! inside a token. Token order is significant: scoring maps best-match indices
//! back to these labels.

/// Tokenize text into normalized tokens.
///
/// Empty or whitespace-only input yields an empty vector, which every
/// downstream component accepts.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(is_separator)
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn is_separator(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\u{0B}'
}
