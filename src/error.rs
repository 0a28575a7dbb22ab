//! Error types for CameoCore.
//!
//! Per-sentence coding problems are never errors: they surface as
//! [`Diagnostic`](crate::coder::Diagnostic)s on the sentence report. The types
//! here cover what must stop a run before it starts: malformed dictionaries,
//! broken code tables and invalid configuration.

use thiserror::Error;

/// Result type for CameoCore operations.
pub type Result<T> = std::result::Result<T, CoderError>;

/// Top-level error type.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoderError {
    /// A dictionary file failed to load.
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),

    /// A code table line could not be parsed or references a missing parent.
    #[error("code table line {line}: {message}")]
    CodeTable { line: usize, message: String },

    /// A code string is not a well-formed event or actor code.
    #[error("invalid code '{code}': {reason}")]
    InvalidCode { code: String, reason: String },

    /// A code was looked up that the table does not define.
    #[error("code '{0}' is not in the code table")]
    UnknownCode(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A date string could not be parsed.
    #[error("invalid date '{0}'")]
    InvalidDate(String),

    /// A TSV record could not be parsed.
    #[error("record line {line}: {message}")]
    Record { line: usize, message: String },

    /// Verb automaton construction failed.
    #[error("failed to build verb automaton: {0}")]
    Automaton(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoderError {
    /// Create an invalid-code error.
    pub fn invalid_code(code: impl Into<String>, reason: impl Into<String>) -> Self {
        CoderError::InvalidCode {
            code: code.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        CoderError::Config(msg.into())
    }
}

/// A fatal dictionary load error, pinned to a line and column.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{source_name}:{line}:{column}: {kind}")]
pub struct DictionaryError {
    pub source_name: String,
    pub line: usize,
    pub column: usize,
    pub kind: SyntaxErrorKind,
}

impl DictionaryError {
    pub fn new(source_name: &str, line: usize, column: usize, kind: SyntaxErrorKind) -> Self {
        Self {
            source_name: source_name.to_string(),
            line,
            column,
            kind,
        }
    }
}

/// What is wrong with a dictionary line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    #[error("unbalanced '{0}'")]
    Unbalanced(char),
    #[error("nested alternation group")]
    NestedGroup,
    #[error("empty alternative in alternation group")]
    EmptyAlternative,
    #[error("entry has no pattern")]
    EmptyPattern,
    #[error("entry has no code")]
    MissingCode,
    #[error("malformed code '{0}'")]
    MalformedCode(String),
    #[error("code '{0}' is not in the code table")]
    UnknownCode(String),
    #[error("code '{code}' cannot be used here: {reason}")]
    InvalidComposition { code: String, reason: String },
    #[error("malformed date restriction '{0}'")]
    MalformedDate(String),
    #[error("date restriction '{0}' overlaps an earlier restriction of the same entry")]
    OverlappingRestriction(String),
    #[error("entry has more than one unrestricted code")]
    DuplicateDefault,
    #[error("synonym line has no preceding entry")]
    OrphanSynonym,
    #[error("pattern line has no preceding verb")]
    OrphanPattern,
    #[error("pattern has more than one verb anchor")]
    DuplicateVerbAnchor,
    #[error("marker '{0}' is only valid in verb patterns")]
    MisplacedMarker(char),
    #[error("unknown section '{0}'")]
    UnknownSection(String),
}

/// Why an actor code is not a valid composition of trigrams.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositionError {
    #[error("actor code is empty")]
    Empty,
    #[error("actor code has more than {0} trigrams")]
    TooLong(usize),
    #[error("unknown trigram '{0}'")]
    UnknownTrigram(String),
    #[error("'{trigram}' ({kind}) cannot appear at position {position}")]
    Misplaced {
        trigram: String,
        kind: String,
        position: usize,
    },
    #[error("trigram '{0}' appears twice")]
    Duplicate(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_error_display_has_location() {
        let err = DictionaryError::new("verbs.txt", 12, 7, SyntaxErrorKind::Unbalanced('{'));
        assert_eq!(err.to_string(), "verbs.txt:12:7: unbalanced '{'");
    }

    #[test]
    fn test_dictionary_error_converts_to_coder_error() {
        let err: CoderError =
            DictionaryError::new("actors.txt", 3, 1, SyntaxErrorKind::MissingCode).into();
        assert!(matches!(err, CoderError::Dictionary(_)));
        assert_eq!(err.to_string(), "actors.txt:3:1: entry has no code");
    }

    #[test]
    fn test_bad_config_json_is_json_error() {
        let err = crate::config::CoderConfig::from_json("{ max_gap: ").unwrap_err();
        assert!(matches!(err, CoderError::Json(_)));
    }
}
