//! Coded events, diagnostics and per-sentence / batch reports
//!
//! Events serialize to JSON through serde and to a GDELT-like tab-separated
//! line with dates as `YYYYMMDD`. The TSV reader exists so prior output can
//! be audited against a newer code table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::codes::{ActorCode, EventCode};
use crate::error::{CoderError, Result};

pub const TSV_HEADER: &str = "sentence_id\tdate\tsource\ttarget\tevent_code\treciprocal\tlinked\tpattern";

// =============================================================================
// CodedEvent
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedEvent {
    pub sentence_id: String,
    pub date: NaiveDate,
    pub source: ActorCode,
    pub target: Option<ActorCode>,
    pub event_code: EventCode,
    /// Mirror of another event in the same sentence
    pub reciprocal: bool,
    /// Second half of a linked `[a:b]` pair
    pub linked: bool,
    /// Verb pattern that produced the event, `None` for a headword default
    pub pattern: Option<String>,
}

impl CodedEvent {
    pub fn to_tsv(&self) -> String {
        let clean = |s: &str| s.replace(['\t', '\n'], " ");
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            clean(&self.sentence_id),
            self.date.format("%Y%m%d"),
            self.source,
            self.target.as_ref().map(|t| t.to_string()).unwrap_or_default(),
            self.event_code,
            u8::from(self.reciprocal),
            u8::from(self.linked),
            self.pattern.as_deref().map(clean).unwrap_or_default(),
        )
    }

    /// Parse TSV lines written by [`to_tsv`](Self::to_tsv). A header line and
    /// blank lines are skipped.
    pub fn from_tsv(text: &str) -> Result<Vec<CodedEvent>> {
        let mut events = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            if raw.trim().is_empty() || raw.starts_with("sentence_id\t") {
                continue;
            }
            let bad = |message: String| CoderError::Record { line, message };
            let fields: Vec<&str> = raw.split('\t').collect();
            if fields.len() < 7 || fields.len() > 8 {
                return Err(bad(format!("expected 8 fields, found {}", fields.len())));
            }
            let date = NaiveDate::parse_from_str(fields[1], "%Y%m%d")
                .map_err(|_| bad(format!("bad date '{}'", fields[1])))?;
            let source = ActorCode::parse(fields[2]).map_err(|e| bad(e.to_string()))?;
            let target = match fields[3].trim() {
                "" => None,
                t => Some(ActorCode::parse(t).map_err(|e| bad(e.to_string()))?),
            };
            let event_code = EventCode::parse(fields[4]).map_err(|e| bad(e.to_string()))?;
            let flag = |s: &str| match s.trim() {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                other => Err(bad(format!("bad flag '{}'", other))),
            };
            let pattern = fields.get(7).map(|p| p.trim()).filter(|p| !p.is_empty());
            events.push(CodedEvent {
                sentence_id: fields[0].to_string(),
                date,
                source,
                target,
                event_code,
                reciprocal: flag(fields[5])?,
                linked: flag(fields[6])?,
                pattern: pattern.map(str::to_string),
            });
        }
        Ok(events)
    }
}

/// Write events as TSV with a header line.
pub fn events_to_tsv<'a, I>(events: I) -> String
where
    I: IntoIterator<Item = &'a CodedEvent>,
{
    let mut out = String::from(TSV_HEADER);
    out.push('\n');
    for event in events {
        out.push_str(&event.to_tsv());
        out.push('\n');
    }
    out
}

// =============================================================================
// Diagnostics
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorSlot {
    Source,
    Target,
}

/// Something the coder noticed while coding one sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Capitalised words no dictionary entry covers
    UnresolvedActor { text: String, start: usize, end: usize },
    /// No date restriction covers the sentence date; the stable prefix was used
    NoDateCoverage {
        entry: String,
        date: NaiveDate,
        coded: Option<String>,
    },
    /// The date fell between two restrictions; the earlier one was kept
    PersistedRestriction {
        entry: String,
        date: NaiveDate,
        code: String,
    },
    /// Two matches on the same span only dictionary order could separate
    PrecedenceTie {
        text: String,
        chosen: String,
        rejected: String,
    },
    /// More than one agent in a phrase; only the best was applied
    AgentsNotCombined {
        phrase: String,
        kept: String,
        dropped: Vec<String>,
    },
    InvalidComposition { code: String, reason: String },
    NoVerb,
    /// A verb was found but neither a pattern nor a default code applies
    UnresolvedVerb { verb: String },
    /// Two patterns of the same verb only dictionary order could separate
    VerbTie {
        verb: String,
        chosen: String,
        rejected: String,
    },
    NoSource { verb: String },
    PlaceholderActor { slot: ActorSlot, verb: String },
    DroppedEvent { verb: String, reason: String },
    Suppressed { verb: String },
    BudgetExhausted { stage: String },
}

impl Diagnostic {
    /// Whether information was lost, as opposed to a decision being noted.
    pub fn is_degrading(&self) -> bool {
        !matches!(
            self,
            Self::PersistedRestriction { .. }
                | Self::PrecedenceTie { .. }
                | Self::VerbTie { .. }
                | Self::Suppressed { .. }
        )
    }
}

// =============================================================================
// Reports
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentenceStatus {
    Resolved,
    PartiallyResolved,
    Unresolved,
}

impl SentenceStatus {
    pub fn classify(events: &[CodedEvent], diagnostics: &[Diagnostic]) -> Self {
        let degraded = diagnostics.iter().any(Diagnostic::is_degrading);
        let suppressed = diagnostics.iter().any(|d| matches!(d, Diagnostic::Suppressed { .. }));
        match (events.is_empty(), degraded) {
            (false, false) => Self::Resolved,
            (false, true) => Self::PartiallyResolved,
            (true, false) if suppressed => Self::Resolved,
            (true, _) => Self::Unresolved,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceReport {
    pub sentence_id: String,
    pub date: NaiveDate,
    pub status: SentenceStatus,
    pub events: Vec<CodedEvent>,
    pub diagnostics: Vec<Diagnostic>,
    pub time_ms: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub sentences: usize,
    pub resolved: usize,
    pub partially_resolved: usize,
    pub unresolved: usize,
    pub events: usize,
    pub diagnostics: usize,
    pub total_time_ms: f64,
    pub dictionary_fingerprint: u64,
}

impl BatchStats {
    pub fn record(&mut self, report: &SentenceReport) {
        self.sentences += 1;
        match report.status {
            SentenceStatus::Resolved => self.resolved += 1,
            SentenceStatus::PartiallyResolved => self.partially_resolved += 1,
            SentenceStatus::Unresolved => self.unresolved += 1,
        }
        self.events += report.events.len();
        self.diagnostics += report.diagnostics.len();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub reports: Vec<SentenceReport>,
    pub stats: BatchStats,
}

impl BatchReport {
    pub fn events(&self) -> impl Iterator<Item = &CodedEvent> {
        self.reports.iter().flat_map(|r| r.events.iter())
    }

    pub fn to_tsv(&self) -> String {
        events_to_tsv(self.events())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> CodedEvent {
        CodedEvent {
            sentence_id: "AFP-001".into(),
            date: NaiveDate::from_ymd_opt(1985, 6, 12).unwrap(),
            source: ActorCode::parse("USAGOV").unwrap(),
            target: Some(ActorCode::parse("EGYGOV").unwrap()),
            event_code: EventCode::parse("019").unwrap(),
            reciprocal: true,
            linked: false,
            pattern: Some("* TO".into()),
        }
    }

    #[test]
    fn test_tsv_line() {
        assert_eq!(event().to_tsv(), "AFP-001\t19850612\tUSAGOV\tEGYGOV\t019\t1\t0\t* TO");
    }

    #[test]
    fn test_tsv_reader_accepts_writer_output() {
        let mut no_target = event();
        no_target.target = None;
        no_target.pattern = None;
        let text = events_to_tsv([event(), no_target.clone()].iter());
        let back = CodedEvent::from_tsv(&text).unwrap();
        assert_eq!(back, vec![event(), no_target]);
    }

    #[test]
    fn test_tsv_reader_errors_have_lines() {
        let text = format!("{}\nAFP-001\t19851312\tUSA\t\t019\t0\t0\t\n", TSV_HEADER);
        match CodedEvent::from_tsv(&text) {
            Err(CoderError::Record { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected record error, got {:?}", other),
        }
    }

    #[test]
    fn test_diagnostic_json_is_tagged() {
        let json = serde_json::to_value(Diagnostic::PlaceholderActor {
            slot: ActorSlot::Target,
            verb: "ASK".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "placeholder_actor");
        assert_eq!(json["slot"], "target");
    }

    #[test]
    fn test_status_classification() {
        let events = vec![event()];
        assert_eq!(SentenceStatus::classify(&events, &[]), SentenceStatus::Resolved);
        assert_eq!(
            SentenceStatus::classify(&events, &[Diagnostic::NoSource { verb: "X".into() }]),
            SentenceStatus::PartiallyResolved
        );
        assert_eq!(
            SentenceStatus::classify(&events, &[Diagnostic::VerbTie {
                verb: "X".into(),
                chosen: "a".into(),
                rejected: "b".into()
            }]),
            SentenceStatus::Resolved,
            "ties are informational"
        );
        assert_eq!(SentenceStatus::classify(&[], &[Diagnostic::NoVerb]), SentenceStatus::Unresolved);
        assert_eq!(
            SentenceStatus::classify(&[], &[Diagnostic::Suppressed { verb: "SAY".into() }]),
            SentenceStatus::Resolved
        );
    }
}
