//! Minimal word tokenizer
//!
//! Unicode word boundaries (UAX #29) with whitespace dropped. Each token keeps
//! its byte span in the source and an uppercase normal form that dictionary
//! lookups key on. Possessive `'s` is split off so that "Israel's army" reads as
//! `ISRAEL 'S ARMY`.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Word,
    Number,
    Punct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Uppercase, typographic apostrophes folded to `'`
    pub norm: String,
    pub start: usize,
    pub end: usize,
    pub kind: TokenKind,
}

impl Token {
    fn new(text: &str, start: usize) -> Self {
        Self {
            text: text.to_string(),
            norm: normalize(text),
            start,
            end: start + text.len(),
            kind: classify(text),
        }
    }

    pub fn is_capitalized(&self) -> bool {
        self.kind == TokenKind::Word && self.text.chars().next().is_some_and(char::is_uppercase)
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }
}

/// Uppercase and fold apostrophe variants.
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' | '`' => '\'',
            c => c,
        })
        .collect::<String>()
        .to_uppercase()
}

fn classify(text: &str) -> TokenKind {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() => TokenKind::Word,
        Some(c) if c.is_ascii_digit() => {
            if text.chars().any(char::is_alphabetic) {
                TokenKind::Word
            } else {
                TokenKind::Number
            }
        }
        Some('\'') | Some('\u{2019}') if text.chars().count() > 1 => TokenKind::Word,
        _ => TokenKind::Punct,
    }
}

/// Split text into tokens.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (start, piece) in text.split_word_bound_indices() {
        if piece.trim().is_empty() {
            continue;
        }
        match possessive_split(piece) {
            Some(split) => {
                tokens.push(Token::new(&piece[..split], start));
                tokens.push(Token::new(&piece[split..], start + split));
            }
            None => tokens.push(Token::new(piece, start)),
        }
    }
    tokens
}

/// Byte offset of a trailing `'s` / `’s`, if the word has one.
fn possessive_split(piece: &str) -> Option<usize> {
    ["'s", "'S", "\u{2019}s", "\u{2019}S"]
        .iter()
        .find(|suffix| piece.len() > suffix.len() && piece.ends_with(*suffix))
        .map(|suffix| piece.len() - suffix.len())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn norms(text: &str) -> Vec<String> {
        tokenize(text).into_iter().map(|t| t.norm).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            norms("Russia and China will ask Asian banks."),
            vec!["RUSSIA", "AND", "CHINA", "WILL", "ASK", "ASIAN", "BANKS", "."]
        );
    }

    #[test]
    fn test_spans_point_into_source() {
        let text = "Israel and Jordan signed";
        for token in tokenize(text) {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn test_possessive_split() {
        assert_eq!(norms("Israel's army"), vec!["ISRAEL", "'S", "ARMY"]);
        assert_eq!(norms("Israel\u{2019}s army"), vec!["ISRAEL", "'S", "ARMY"]);
        let tokens = tokenize("Israel's");
        assert_eq!(tokens[1].start, 6);
        assert_eq!(tokens[1].kind, TokenKind::Word);
    }

    #[test]
    fn test_kinds_and_capitals() {
        let tokens = tokenize("Mubarak met 3 envoys, today");
        assert!(tokens[0].is_capitalized());
        assert!(!tokens[1].is_capitalized());
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[4].kind, TokenKind::Punct);
    }
}
