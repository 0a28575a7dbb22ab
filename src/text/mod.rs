//! Input text: dated sentences and their tokens.

pub mod tokenize;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoderError, Result};

pub use tokenize::{normalize, tokenize, Token, TokenKind};

/// One dated sentence to code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub id: String,
    pub text: String,
    pub date: NaiveDate,
}

impl Sentence {
    pub fn new(id: impl Into<String>, text: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            date,
        }
    }
}

/// Parse `YYYYMMDD` or `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .map_err(|_| CoderError::InvalidDate(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(1994, 3, 1).unwrap();
        assert_eq!(parse_date("19940301").unwrap(), expected);
        assert_eq!(parse_date("1994-03-01").unwrap(), expected);
        assert!(parse_date("1994/03/01").is_err());
        assert!(parse_date("19941301").is_err());
    }
}
