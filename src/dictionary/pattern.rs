//! Dictionary line lexer
//!
//! Splits a dictionary line into its pattern text and bracketed code groups,
//! then breaks the pattern into units:
//!
//! ```text
//! ISRAELI_LABOR_PARTY [ISRGOV 19920713-19960617]   noun entry
//! - {WILL|WOULD|IS_TO} * + TO HELP FINANCE [0231]  verb pattern
//! ```
//!
//! `_` joins atoms into one contiguous run. Space does too in noun patterns;
//! in verb patterns it separates units that may have a gap between them.
//! `{A|B_C}` is an alternation of word sequences, `*` is the verb anchor in
//! verb patterns and a one-token wildcard in noun patterns, and `$`, `+`, `%`
//! mark the source slot, target slot and compound pairing.

use crate::error::SyntaxErrorKind;
use crate::text::{normalize, tokenize};

/// Which grammar a pattern is read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternMode {
    Noun,
    Verb,
}

/// A lexing failure at a 1-based column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub column: usize,
    pub kind: SyntaxErrorKind,
}

impl LexError {
    fn new(column: usize, kind: SyntaxErrorKind) -> Self {
        Self { column, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAtom {
    Word(String),
    /// Alternatives, each a sequence of words
    Choice(Vec<Vec<String>>),
    Star,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawUnit {
    Run(Vec<RawAtom>),
    Source,
    Target,
    Compound,
}

/// A bracketed code group and where it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGroup<'a> {
    pub text: &'a str,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLine<'a> {
    pub pattern: &'a str,
    pub pattern_column: usize,
    pub codes: Vec<CodeGroup<'a>>,
}

// =============================================================================
// Line Splitting
// =============================================================================

/// Separate `PATTERN [CODE] [CODE DATES] # comment` into its parts.
/// `offset` is the column of `line[0]` minus one.
pub fn split_line(line: &str, offset: usize) -> Result<SplitLine<'_>, LexError> {
    let body_end = comment_start(line).unwrap_or(line.len());
    let body = &line[..body_end];

    let first_bracket = body.find(['[', ']']).unwrap_or(body.len());
    let pattern = &body[..first_bracket];
    let lead = pattern.len() - pattern.trim_start().len();

    let mut codes = Vec::new();
    let mut rest = &body[first_bracket..];
    let mut pos = first_bracket;
    loop {
        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();
        rest = trimmed;
        if rest.is_empty() {
            break;
        }
        if !rest.starts_with('[') {
            let column = offset + pos + 1;
            return Err(if rest.starts_with(']') {
                LexError::new(column, SyntaxErrorKind::Unbalanced(']'))
            } else {
                let junk = rest.split_whitespace().next().unwrap_or(rest);
                LexError::new(column, SyntaxErrorKind::MalformedCode(junk.to_string()))
            });
        }
        let close = match rest.find(']') {
            Some(close) => close,
            None => return Err(LexError::new(offset + pos + 1, SyntaxErrorKind::Unbalanced('['))),
        };
        if rest[1..close].contains('[') {
            return Err(LexError::new(offset + pos + 1, SyntaxErrorKind::Unbalanced('[')));
        }
        codes.push(CodeGroup {
            text: rest[1..close].trim(),
            column: offset + pos + 2,
        });
        rest = &rest[close + 1..];
        pos += close + 1;
    }

    Ok(SplitLine {
        pattern: pattern.trim(),
        pattern_column: offset + lead + 1,
        codes,
    })
}

/// `#` starts a comment at the beginning of a line or after whitespace.
fn comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    (0..bytes.len()).find(|&i| bytes[i] == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()))
}

// =============================================================================
// Pattern Parsing
// =============================================================================

/// Parse pattern text into units. `column` is the 1-based column of `text[0]`.
pub fn parse_pattern(text: &str, column: usize, mode: PatternMode) -> Result<Vec<RawUnit>, LexError> {
    let mut units = Vec::new();
    let mut stars = 0usize;

    for (start, piece) in pieces(text, column)? {
        let at = column + start;
        let marker = match piece {
            "$" => Some(RawUnit::Source),
            "+" => Some(RawUnit::Target),
            "%" => Some(RawUnit::Compound),
            _ => None,
        };
        if let Some(marker) = marker {
            if mode == PatternMode::Noun {
                let c = piece.chars().next().unwrap_or('$');
                return Err(LexError::new(at, SyntaxErrorKind::MisplacedMarker(c)));
            }
            units.push(marker);
            continue;
        }

        let atoms = parse_run(piece, at)?;
        stars += atoms.iter().filter(|a| matches!(a, RawAtom::Star)).count();
        if mode == PatternMode::Verb && stars > 1 {
            return Err(LexError::new(at, SyntaxErrorKind::DuplicateVerbAnchor));
        }
        if atoms.is_empty() {
            continue;
        }
        match (mode, units.last_mut()) {
            // Noun patterns are contiguous: space behaves like `_`
            (PatternMode::Noun, Some(RawUnit::Run(prev))) => prev.extend(atoms),
            _ => units.push(RawUnit::Run(atoms)),
        }
    }

    if units.is_empty() {
        return Err(LexError::new(column, SyntaxErrorKind::EmptyPattern));
    }
    Ok(units)
}

/// Whitespace-separated pieces, with whitespace inside `{}` kept.
fn pieces(text: &str, column: usize) -> Result<Vec<(usize, &str)>, LexError> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        match c {
            '{' => {
                if depth > 0 {
                    return Err(LexError::new(column + i, SyntaxErrorKind::NestedGroup));
                }
                depth = 1;
            }
            '}' => {
                if depth == 0 {
                    return Err(LexError::new(column + i, SyntaxErrorKind::Unbalanced('}')));
                }
                depth = 0;
            }
            _ => {}
        }
        if c.is_whitespace() && depth == 0 {
            if let Some(s) = start.take() {
                out.push((s, &text[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if depth > 0 {
        let open = text.rfind('{').unwrap_or(0);
        return Err(LexError::new(column + open, SyntaxErrorKind::Unbalanced('{')));
    }
    if let Some(s) = start {
        out.push((s, &text[s..]));
    }
    Ok(out)
}

/// One piece: words, groups and `*` joined by `_`.
fn parse_run(piece: &str, column: usize) -> Result<Vec<RawAtom>, LexError> {
    let mut atoms = Vec::new();
    let mut word_start: Option<usize> = None;
    let mut chars = piece.char_indices().peekable();

    let flush = |atoms: &mut Vec<RawAtom>, word: &str| {
        if word == "*" {
            atoms.push(RawAtom::Star);
        } else {
            atoms.extend(word_keys(word).into_iter().map(RawAtom::Word));
        }
    };

    while let Some((i, c)) = chars.next() {
        match c {
            '_' => {
                if let Some(s) = word_start.take() {
                    flush(&mut atoms, &piece[s..i]);
                }
            }
            '{' => {
                if let Some(s) = word_start.take() {
                    flush(&mut atoms, &piece[s..i]);
                }
                let close = piece[i..].find('}').map(|j| i + j).ok_or_else(|| {
                    LexError::new(column + i, SyntaxErrorKind::Unbalanced('{'))
                })?;
                atoms.push(parse_choice(&piece[i + 1..close], column + i + 1)?);
                while chars.peek().is_some_and(|&(j, _)| j <= close) {
                    chars.next();
                }
            }
            _ => {
                if word_start.is_none() {
                    word_start = Some(i);
                }
            }
        }
    }
    if let Some(s) = word_start {
        flush(&mut atoms, &piece[s..]);
    }
    Ok(atoms)
}

fn parse_choice(inner: &str, column: usize) -> Result<RawAtom, LexError> {
    let mut alternatives = Vec::new();
    let mut offset = 0;
    for alt in inner.split('|') {
        let words: Vec<String> = alt
            .split(|c: char| c == '_' || c.is_whitespace())
            .filter(|w| !w.is_empty())
            .map(|w| {
                if w == "*" {
                    Err(LexError::new(column + offset, SyntaxErrorKind::MisplacedMarker('*')))
                } else {
                    Ok(word_keys(w))
                }
            })
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect();
        if words.is_empty() {
            return Err(LexError::new(column + offset, SyntaxErrorKind::EmptyAlternative));
        }
        alternatives.push(words);
        offset += alt.len() + 1;
    }
    Ok(RawAtom::Choice(alternatives))
}

/// Normalize a pattern word the way the tokenizer would split it, so that
/// `AL-QAEDA` becomes `AL`, `-`, `QAEDA`. A leading apostrophe (`'S`) is kept
/// whole to line up with the possessive split.
pub fn word_keys(word: &str) -> Vec<String> {
    if word.starts_with('\'') || word.starts_with('\u{2019}') {
        return vec![normalize(word)];
    }
    let keys: Vec<String> = tokenize(word).into_iter().map(|t| t.norm).collect();
    if keys.is_empty() {
        vec![normalize(word)]
    } else {
        keys
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_split_line_codes() {
        let split = split_line("ISRAELI_LABOR_PARTY [ISRGOV 19920713-19960617] [ISROPP 19960618-19990517]", 0)
            .unwrap();
        assert_eq!(split.pattern, "ISRAELI_LABOR_PARTY");
        assert_eq!(split.pattern_column, 1);
        assert_eq!(split.codes.len(), 2);
        assert_eq!(split.codes[0].text, "ISRGOV 19920713-19960617");
        assert_eq!(split.codes[0].column, 22);
    }

    #[test]
    fn test_split_line_comment_and_errors() {
        let split = split_line("BANKS [~BUS]  # financial", 0).unwrap();
        assert_eq!(split.codes[0].text, "~BUS");

        let err = split_line("BANKS [BUS", 0).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::Unbalanced('['));
        assert_eq!(err.column, 7);

        let err = split_line("BANKS [BUS] junk", 0).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MalformedCode("junk".into()));

        assert_eq!(
            split_line("BANKS BUS]", 0).unwrap_err().kind,
            SyntaxErrorKind::Unbalanced(']')
        );
    }

    #[test]
    fn test_noun_pattern_is_one_run() {
        let units = parse_pattern("EGYPTIAN PRESIDENT_HOSNI", 1, PatternMode::Noun).unwrap();
        assert_eq!(
            units,
            vec![RawUnit::Run(vec![
                RawAtom::Word("EGYPTIAN".into()),
                RawAtom::Word("PRESIDENT".into()),
                RawAtom::Word("HOSNI".into()),
            ])]
        );
    }

    #[test]
    fn test_verb_pattern_units() {
        let units = parse_pattern("{WILL|WOULD|IS_TO} * + TO HELP FINANCE", 3, PatternMode::Verb).unwrap();
        assert_eq!(units.len(), 6);
        assert_eq!(
            units[0],
            RawUnit::Run(vec![RawAtom::Choice(vec![
                words(&["WILL"]),
                words(&["WOULD"]),
                words(&["IS", "TO"]),
            ])])
        );
        assert_eq!(units[1], RawUnit::Run(vec![RawAtom::Star]));
        assert_eq!(units[2], RawUnit::Target);
    }

    #[test]
    fn test_markers_only_in_verbs() {
        let err = parse_pattern("$ ADMIRAL", 1, PatternMode::Noun).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MisplacedMarker('$'));
        assert!(parse_pattern("% * MILITARY ACCORD", 1, PatternMode::Verb).is_ok());
    }

    #[test]
    fn test_group_errors_have_columns() {
        let err = parse_pattern("* {A|{B}}", 1, PatternMode::Verb).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::NestedGroup);
        assert_eq!(err.column, 6);

        let err = parse_pattern("* {A|B", 1, PatternMode::Verb).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::Unbalanced('{'));
        assert_eq!(err.column, 3);

        let err = parse_pattern("* {A||B}", 1, PatternMode::Verb).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::EmptyAlternative);

        let err = parse_pattern("* TO *", 1, PatternMode::Verb).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::DuplicateVerbAnchor);
        assert_eq!(err.column, 6);
    }

    #[test]
    fn test_hyphenated_word_keys() {
        assert_eq!(word_keys("al-Qaeda"), words(&["AL", "-", "QAEDA"]));
        assert_eq!(word_keys("'s"), words(&["'S"]));
    }
}
