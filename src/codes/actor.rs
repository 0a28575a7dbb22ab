//! CAMEO actor codes
//!
//! An actor code is a concatenation of one to five three-letter trigrams:
//! `USA`, `USAGOV`, `ISRGOVMIL`. Position matters: a country or region leads,
//! roles and organisations refine it. Which trigram may sit where is decided by
//! the [`CodeTable`](super::CodeTable); this module only handles the shape.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;

use crate::error::{CoderError, CompositionError};

/// Maximum number of trigrams in one actor code (15 characters).
pub const MAX_TRIGRAMS: usize = 5;

// =============================================================================
// Trigram
// =============================================================================

/// Three uppercase ASCII letters or digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Trigram([u8; 3]);

impl Trigram {
    pub fn parse(s: &str) -> Result<Self, CoderError> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 {
            return Err(CoderError::invalid_code(s, "trigram must be three characters"));
        }
        if !bytes
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(CoderError::invalid_code(
                s,
                "trigram must be uppercase letters or digits",
            ));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2]]))
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII bytes are ever stored
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for Trigram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ActorCode
// =============================================================================

/// A sequence of trigrams. Composition rules are checked by
/// [`CodeTable::validate_actor`](super::CodeTable::validate_actor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorCode {
    parts: SmallVec<[Trigram; MAX_TRIGRAMS]>,
}

impl ActorCode {
    /// Parse a concatenated code such as `USAGOV`.
    pub fn parse(s: &str) -> Result<Self, CoderError> {
        let s = s.trim();
        if s.is_empty() || s.len() % 3 != 0 {
            return Err(CoderError::invalid_code(
                s,
                "actor codes are one or more three-letter trigrams",
            ));
        }
        if s.len() > MAX_TRIGRAMS * 3 {
            return Err(CoderError::invalid_code(
                s,
                format!("actor codes have at most {} trigrams", MAX_TRIGRAMS),
            ));
        }
        if !s.is_ascii() {
            return Err(CoderError::invalid_code(s, "actor codes are ASCII"));
        }
        let parts = (0..s.len())
            .step_by(3)
            .map(|i| Trigram::parse(&s[i..i + 3]))
            .collect::<Result<SmallVec<_>, _>>()?;
        Ok(Self { parts })
    }

    pub fn from_trigrams(trigrams: &[Trigram]) -> Result<Self, CompositionError> {
        if trigrams.is_empty() {
            return Err(CompositionError::Empty);
        }
        if trigrams.len() > MAX_TRIGRAMS {
            return Err(CompositionError::TooLong(MAX_TRIGRAMS));
        }
        Ok(Self {
            parts: trigrams.iter().copied().collect(),
        })
    }

    pub fn trigrams(&self) -> &[Trigram] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn contains(&self, trigram: Trigram) -> bool {
        self.parts.contains(&trigram)
    }

    /// Leading trigram (country, region or unidentified marker).
    pub fn head(&self) -> Option<Trigram> {
        self.parts.first().copied()
    }

    /// Longest trigram prefix shared by every code, `None` if they share nothing.
    pub fn common_prefix<'a, I>(codes: I) -> Option<ActorCode>
    where
        I: IntoIterator<Item = &'a ActorCode>,
    {
        let mut iter = codes.into_iter();
        let first = iter.next()?;
        let mut len = first.parts.len();
        for code in iter {
            len = first
                .parts
                .iter()
                .zip(code.parts.iter())
                .take(len)
                .take_while(|(a, b)| a == b)
                .count();
            if len == 0 {
                return None;
            }
        }
        Some(Self {
            parts: first.parts[..len].iter().copied().collect(),
        })
    }

    /// Append an agent fragment, skipping trigrams this code already carries.
    ///
    /// `GOV` added to `USAGOV` is a no-op; `MIL` added to `USAGOV` gives
    /// `USAGOVMIL`. Fails if the result would exceed [`MAX_TRIGRAMS`].
    pub fn append_fragment(&self, fragment: &ActorCode) -> Result<ActorCode, CompositionError> {
        let mut parts = self.parts.clone();
        for trigram in fragment.trigrams() {
            if !parts.contains(trigram) {
                parts.push(*trigram);
            }
        }
        if parts.len() > MAX_TRIGRAMS {
            return Err(CompositionError::TooLong(MAX_TRIGRAMS));
        }
        Ok(Self { parts })
    }
}

impl fmt::Display for ActorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            f.write_str(part.as_str())?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ActorCode {
    type Err = CoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Trigram> for ActorCode {
    fn from(trigram: Trigram) -> Self {
        let mut parts = SmallVec::new();
        parts.push(trigram);
        Self { parts }
    }
}

impl Serialize for ActorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ActorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ActorCode::parse(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> ActorCode {
        ActorCode::parse(s).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let c = code("ISRGOVMIL");
        assert_eq!(c.len(), 3);
        assert_eq!(c.trigrams()[1].as_str(), "GOV");
        assert_eq!(c.to_string(), "ISRGOVMIL");
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!(ActorCode::parse("").is_err());
        assert!(ActorCode::parse("US").is_err());
        assert!(ActorCode::parse("USAG").is_err());
        assert!(ActorCode::parse("usa").is_err(), "lowercase is not a code");
        assert!(ActorCode::parse("USAGOVMILREBOPPBUS").is_err(), "six trigrams");
    }

    #[test]
    fn test_append_fragment_dedupes() {
        let c = code("USAGOV");
        assert_eq!(c.append_fragment(&code("GOV")).unwrap(), c);
        assert_eq!(c.append_fragment(&code("MIL")).unwrap().to_string(), "USAGOVMIL");
        assert_eq!(
            c.append_fragment(&code("GOVMIL")).unwrap().to_string(),
            "USAGOVMIL"
        );
    }

    #[test]
    fn test_append_fragment_overflow() {
        let c = code("USAGOVMILREB");
        assert!(c.append_fragment(&code("OPP")).is_ok());
        assert_eq!(
            c.append_fragment(&code("OPPBUS")),
            Err(CompositionError::TooLong(MAX_TRIGRAMS))
        );
    }

    #[test]
    fn test_common_prefix() {
        let codes = [code("ISRGOV"), code("ISROPP"), code("ISRGOVMIL")];
        assert_eq!(ActorCode::common_prefix(codes.iter()), Some(code("ISR")));

        let same = [code("USAGOV"), code("USAGOVMIL")];
        assert_eq!(ActorCode::common_prefix(same.iter()), Some(code("USAGOV")));

        let disjoint = [code("USA"), code("RUS")];
        assert_eq!(ActorCode::common_prefix(disjoint.iter()), None);
        assert_eq!(ActorCode::common_prefix(std::iter::empty()), None);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&code("RUSGOV")).unwrap();
        assert_eq!(json, "\"RUSGOV\"");
        let back: ActorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code("RUSGOV"));
    }
}
