//! CAMEO event codes
//!
//! A two-digit root (`01`..`20`), an optional third digit for the subtype and
//! an optional fourth digit for a refinement: `02` → `023` → `0231`.
//! A subtype ending in `0` (`010`, `140`, `200`) is the residual code of its
//! root, used only when no more specific sibling applies.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoderError;

/// A validated CAMEO event code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventCode(String);

impl EventCode {
    /// Parse a 2-4 digit code with a root between 01 and 20.
    pub fn parse(s: &str) -> Result<Self, CoderError> {
        let s = s.trim();
        if !(2..=4).contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoderError::invalid_code(s, "event codes are 2-4 digits"));
        }
        let root: u8 = s[..2]
            .parse()
            .map_err(|_| CoderError::invalid_code(s, "unreadable root"))?;
        if !(1..=20).contains(&root) {
            return Err(CoderError::invalid_code(s, "root must be between 01 and 20"));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The two-digit root category (`"14"` for `"145"`).
    pub fn root(&self) -> &str {
        &self.0[..2]
    }

    /// Hierarchy level: 1 for roots, 2 for subtypes, 3 for refinements.
    pub fn level(&self) -> u8 {
        (self.0.len() - 1) as u8
    }

    /// The code one level up, `None` for roots.
    pub fn parent(&self) -> Option<EventCode> {
        match self.0.len() {
            3 => Some(Self(self.0[..2].to_string())),
            4 => Some(Self(self.0[..3].to_string())),
            _ => None,
        }
    }

    /// Residual ("not otherwise specified") subtype of its root.
    pub fn is_residual(&self) -> bool {
        self.0.len() == 3 && self.0.ends_with('0')
    }

    pub fn is_ancestor_of(&self, other: &EventCode) -> bool {
        other.0.len() > self.0.len() && other.0.starts_with(&self.0)
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EventCode {
    type Error = CoderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EventCode> for String {
    fn from(code: EventCode) -> Self {
        code.0
    }
}

impl std::str::FromStr for EventCode {
    type Err = CoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy() {
        let code = EventCode::parse("0211").unwrap();
        assert_eq!(code.root(), "02");
        assert_eq!(code.level(), 3);
        assert_eq!(code.parent().unwrap().as_str(), "021");
        assert_eq!(code.parent().unwrap().parent().unwrap().as_str(), "02");
        assert!(code.parent().unwrap().parent().unwrap().parent().is_none());
    }

    #[test]
    fn test_three_digit_root() {
        let code = EventCode::parse("145").unwrap();
        assert_eq!(code.root(), "14");
        assert_eq!(code.parent().unwrap().as_str(), "14");
    }

    #[test]
    fn test_residual() {
        assert!(EventCode::parse("010").unwrap().is_residual());
        assert!(EventCode::parse("140").unwrap().is_residual());
        assert!(EventCode::parse("200").unwrap().is_residual());
        assert!(!EventCode::parse("057").unwrap().is_residual());
        assert!(!EventCode::parse("14").unwrap().is_residual());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(EventCode::parse("2").is_err());
        assert!(EventCode::parse("02111").is_err());
        assert!(EventCode::parse("0a1").is_err());
        assert!(EventCode::parse("21").is_err(), "root 21 does not exist");
        assert!(EventCode::parse("00").is_err());
    }

    #[test]
    fn test_ancestor() {
        let root = EventCode::parse("06").unwrap();
        let leaf = EventCode::parse("062").unwrap();
        assert!(root.is_ancestor_of(&leaf));
        assert!(!leaf.is_ancestor_of(&root));
        assert!(!leaf.is_ancestor_of(&leaf));
    }

    #[test]
    fn test_serde_as_string() {
        let code = EventCode::parse("0231").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"0231\"");
        let back: EventCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
        assert!(serde_json::from_str::<EventCode>("\"99\"").is_err());
    }
}
