//! Date-restricted codes
//!
//! A dictionary entry can carry several code fragments, each valid over an
//! inclusive date interval, plus at most one unrestricted default:
//!
//! ```text
//! ISRAELI_LABOR_PARTY [ISRGOV 19920713-19960617] [ISROPP 19960618-19990517]
//! REAGAN [USAELI] [USAGOV 810120-890120]
//! ```
//!
//! `<d` means up to the day before `d`, `>d` from the day after `d`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codes::ActorCode;
use crate::error::SyntaxErrorKind;

// =============================================================================
// DateRange
// =============================================================================

/// Inclusive interval, either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Parse `<d`, `>d` or `a-b`; dates are `YYMMDD` or `YYYYMMDD`.
    pub fn parse(s: &str, year_pivot: u32) -> Result<Self, SyntaxErrorKind> {
        let malformed = || SyntaxErrorKind::MalformedDate(s.to_string());
        let s = s.trim();
        if let Some(rest) = s.strip_prefix('<') {
            let to = parse_day(rest, year_pivot).and_then(|d| d.pred_opt());
            return to
                .map(|to| Self { from: None, to: Some(to) })
                .ok_or_else(malformed);
        }
        if let Some(rest) = s.strip_prefix('>') {
            let from = parse_day(rest, year_pivot).and_then(|d| d.succ_opt());
            return from
                .map(|from| Self { from: Some(from), to: None })
                .ok_or_else(malformed);
        }
        let (a, b) = s.split_once('-').ok_or_else(malformed)?;
        let from = parse_day(a, year_pivot).ok_or_else(malformed)?;
        let to = parse_day(b, year_pivot).ok_or_else(malformed)?;
        if from > to {
            return Err(malformed());
        }
        Ok(Self {
            from: Some(from),
            to: Some(to),
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| f <= date) && self.to.map_or(true, |t| date <= t)
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        let starts_before_other_ends = match (self.from, other.to) {
            (Some(f), Some(t)) => f <= t,
            _ => true,
        };
        let ends_after_other_starts = match (self.to, other.from) {
            (Some(t), Some(f)) => t >= f,
            _ => true,
        };
        starts_before_other_ends && ends_after_other_starts
    }

    fn ends_before(&self, date: NaiveDate) -> bool {
        self.to.is_some_and(|t| t < date)
    }

    fn starts_after(&self, date: NaiveDate) -> bool {
        self.from.is_some_and(|f| f > date)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day = |d: Option<NaiveDate>| d.map(|d| d.format("%Y%m%d").to_string()).unwrap_or_default();
        write!(f, "{}-{}", day(self.from), day(self.to))
    }
}

fn parse_day(s: &str, year_pivot: u32) -> Option<NaiveDate> {
    let s = s.trim();
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match s.len() {
        8 => NaiveDate::parse_from_str(s, "%Y%m%d").ok(),
        6 => {
            let yy: i32 = s[..2].parse().ok()?;
            let month: u32 = s[2..4].parse().ok()?;
            let day: u32 = s[4..].parse().ok()?;
            let century = if (yy as u32) < year_pivot { 2000 } else { 1900 };
            NaiveDate::from_ymd_opt(century + yy, month, day)
        }
        _ => None,
    }
}

// =============================================================================
// DateRestrictions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedCode {
    pub code: ActorCode,
    pub range: DateRange,
}

/// Outcome of resolving an entry's code for a sentence date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateResolution<'a> {
    /// An interval contains the date
    Active(&'a ActorCode),
    /// No interval applies, the unrestricted code does
    Default(&'a ActorCode),
    /// The date falls in a gap between two intervals; the earlier one persists
    Persisted(&'a ActorCode),
    NoCoverage,
}

impl<'a> DateResolution<'a> {
    pub fn code(&self) -> Option<&'a ActorCode> {
        match *self {
            Self::Active(c) | Self::Default(c) | Self::Persisted(c) => Some(c),
            Self::NoCoverage => None,
        }
    }
}

/// All code fragments of one entry, ordered by interval start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRestrictions {
    restricted: Vec<DatedCode>,
    default: Option<ActorCode>,
}

impl DateRestrictions {
    pub fn unrestricted(code: ActorCode) -> Self {
        Self {
            restricted: Vec::new(),
            default: Some(code),
        }
    }

    /// Add a fragment; overlapping intervals and a second default are refused.
    pub fn push(&mut self, code: ActorCode, range: Option<DateRange>) -> Result<(), SyntaxErrorKind> {
        match range {
            None => {
                if self.default.is_some() {
                    return Err(SyntaxErrorKind::DuplicateDefault);
                }
                self.default = Some(code);
            }
            Some(range) => {
                if self.restricted.iter().any(|d| d.range.overlaps(&range)) {
                    return Err(SyntaxErrorKind::OverlappingRestriction(range.to_string()));
                }
                let at = self
                    .restricted
                    .partition_point(|d| d.range.from <= range.from);
                self.restricted.insert(at, DatedCode { code, range });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.restricted.is_empty() && self.default.is_none()
    }

    pub fn is_restricted(&self) -> bool {
        !self.restricted.is_empty()
    }

    pub fn default_code(&self) -> Option<&ActorCode> {
        self.default.as_ref()
    }

    pub fn restricted(&self) -> &[DatedCode] {
        &self.restricted
    }

    /// Every fragment, restricted first.
    pub fn codes(&self) -> impl Iterator<Item = &ActorCode> {
        self.restricted
            .iter()
            .map(|d| &d.code)
            .chain(self.default.iter())
    }

    pub fn resolve(&self, date: NaiveDate, persist: bool) -> DateResolution<'_> {
        if let Some(active) = self.restricted.iter().find(|d| d.range.contains(date)) {
            return DateResolution::Active(&active.code);
        }
        if let Some(default) = &self.default {
            return DateResolution::Default(default);
        }
        if persist && self.restricted.iter().any(|d| d.range.starts_after(date)) {
            let prior = self
                .restricted
                .iter()
                .filter(|d| d.range.ends_before(date))
                .max_by_key(|d| d.range.to);
            if let Some(prior) = prior {
                return DateResolution::Persisted(&prior.code);
            }
        }
        DateResolution::NoCoverage
    }

    /// Trigrams shared by every fragment, coded when no fragment applies.
    pub fn stable_prefix(&self) -> Option<ActorCode> {
        ActorCode::common_prefix(self.codes())
    }
}

// =============================================================================
// Tests
// =============================================================================
