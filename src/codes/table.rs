//! CodeTable: the CAMEO event and actor code hierarchy
//!
//! Loaded from a pipe-separated text table:
//!
//! ```text
//! # comment
//! EVENT   | 023  | Appeal for aid
//! EVENT   | 0231 | Appeal for economic aid
//! EVENT   | 057  | Sign formal agreement | symmetric
//! COUNTRY | USA  | United States
//! ROLE    | GOV  | Government
//! ```
//!
//! Event codes get their level and parent from their digits; every parent must
//! be defined. Actor trigrams get a [`CodeKind`] that decides where in an
//! actor code they may appear.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use super::actor::{ActorCode, Trigram};
use super::event::EventCode;
use crate::coder::CodedEvent;
use crate::error::{CoderError, CompositionError, Result};

const BUILTIN_TABLE: &str = include_str!("../../data/cameo.codes");

// =============================================================================
// Types
// =============================================================================

/// What a code denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    Event,
    Country,
    Region,
    International,
    Role,
    Organization,
    Religion,
    Ethnic,
    Unidentified,
}

impl CodeKind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "EVENT" => Self::Event,
            "COUNTRY" => Self::Country,
            "REGION" => Self::Region,
            "INTL" => Self::International,
            "ROLE" => Self::Role,
            "ORG" => Self::Organization,
            "RELIGION" => Self::Religion,
            "ETHNIC" => Self::Ethnic,
            "UNIDENTIFIED" => Self::Unidentified,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Country => "country",
            Self::Region => "region",
            Self::International => "international",
            Self::Role => "role",
            Self::Organization => "organization",
            Self::Religion => "religion",
            Self::Ethnic => "ethnic",
            Self::Unidentified => "unidentified",
        }
    }

    /// Whether a trigram of this kind may appear at `position` in an actor code.
    pub fn allowed_at(&self, position: usize) -> bool {
        match self {
            Self::Event => false,
            Self::Country | Self::Region | Self::Unidentified => position == 0,
            _ => true,
        }
    }
}

/// One row of the code table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMeta {
    pub code: String,
    pub name: String,
    pub kind: CodeKind,
    /// 1-3 for event codes, 1 for trigrams
    pub level: u8,
    pub parent: Option<String>,
    /// Event is coded in both directions when both actors are known
    pub symmetric: bool,
}

/// A problem found by [`CodeTable::audit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFinding {
    pub record: usize,
    pub sentence_id: String,
    pub field: String,
    pub code: String,
    pub problem: String,
}

// =============================================================================
// CodeTable
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct CodeTable {
    codes: HashMap<String, CodeMeta>,
    children: HashMap<String, Vec<String>>,
}

impl CodeTable {
    /// The compact CAMEO subset shipped with the crate.
    ///
    /// Panics if the embedded table is malformed, which `test_builtin_parses`
    /// rules out at build time.
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_TABLE).expect("built-in code table should parse")
    }

    pub fn parse(text: &str) -> Result<Self> {
        let line_re = Regex::new(
            r"^\s*([A-Z]+)\s*\|\s*([0-9A-Z]+)\s*\|\s*([^|]*?)\s*(?:\|\s*([^|]*?)\s*)?$",
        )
        .map_err(|e| CoderError::CodeTable {
            line: 0,
            message: e.to_string(),
        })?;

        let mut table = Self::default();
        let mut event_lines: Vec<(usize, EventCode)> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let table_error = |message: String| CoderError::CodeTable {
                line: line_no,
                message,
            };

            let caps = line_re
                .captures(line)
                .ok_or_else(|| table_error("expected 'KIND | CODE | Name | flags'".into()))?;
            let keyword = &caps[1];
            let code = &caps[2];
            let name = caps[3].to_string();
            let flags = caps.get(4).map(|m| m.as_str()).unwrap_or("");

            let kind = CodeKind::from_keyword(keyword)
                .ok_or_else(|| table_error(format!("unknown kind '{}'", keyword)))?;

            let mut symmetric = false;
            for flag in flags.split_whitespace() {
                match flag {
                    "symmetric" => symmetric = true,
                    other => return Err(table_error(format!("unknown flag '{}'", other))),
                }
            }

            let meta = if kind == CodeKind::Event {
                let event = EventCode::parse(code).map_err(|e| table_error(e.to_string()))?;
                let meta = CodeMeta {
                    code: event.to_string(),
                    name,
                    kind,
                    level: event.level(),
                    parent: event.parent().map(|p| p.to_string()),
                    symmetric,
                };
                event_lines.push((line_no, event));
                meta
            } else {
                if symmetric {
                    return Err(table_error("only event codes can be symmetric".into()));
                }
                let trigram = Trigram::parse(code).map_err(|e| table_error(e.to_string()))?;
                CodeMeta {
                    code: trigram.to_string(),
                    name,
                    kind,
                    level: 1,
                    parent: None,
                    symmetric: false,
                }
            };

            if table.codes.contains_key(&meta.code) {
                return Err(table_error(format!("code '{}' defined twice", meta.code)));
            }
            table.codes.insert(meta.code.clone(), meta);
        }

        // Parents may be defined after their children
        for (line, event) in &event_lines {
            if let Some(parent) = event.parent() {
                match table.codes.get(parent.as_str()) {
                    Some(meta) if meta.kind == CodeKind::Event => {}
                    _ => {
                        return Err(CoderError::CodeTable {
                            line: *line,
                            message: format!("parent '{}' of '{}' is not defined", parent, event),
                        })
                    }
                }
                table
                    .children
                    .entry(parent.to_string())
                    .or_default()
                    .push(event.to_string());
            }
        }
        for kids in table.children.values_mut() {
            kids.sort();
        }

        info!(
            codes = table.codes.len(),
            events = event_lines.len(),
            "code table loaded"
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn lookup(&self, code: &str) -> Option<&CodeMeta> {
        self.codes.get(code)
    }

    pub fn require(&self, code: &str) -> Result<&CodeMeta> {
        self.lookup(code)
            .ok_or_else(|| CoderError::UnknownCode(code.to_string()))
    }

    pub fn contains_event(&self, code: &EventCode) -> bool {
        matches!(self.lookup(code.as_str()), Some(m) if m.kind == CodeKind::Event)
    }

    pub fn is_symmetric(&self, code: &EventCode) -> bool {
        self.lookup(code.as_str()).is_some_and(|m| m.symmetric)
    }

    /// Direct children of an event code, sorted.
    pub fn children(&self, code: &str) -> Vec<&CodeMeta> {
        self.children
            .get(code)
            .map(|kids| kids.iter().filter_map(|k| self.codes.get(k)).collect())
            .unwrap_or_default()
    }

    /// Check trigram kinds, positions and repetition.
    pub fn validate_actor(&self, code: &ActorCode) -> std::result::Result<(), CompositionError> {
        let trigrams = code.trigrams();
        if trigrams.is_empty() {
            return Err(CompositionError::Empty);
        }
        for (position, trigram) in trigrams.iter().enumerate() {
            let meta = self
                .lookup(trigram.as_str())
                .ok_or_else(|| CompositionError::UnknownTrigram(trigram.to_string()))?;
            if !meta.kind.allowed_at(position) {
                return Err(CompositionError::Misplaced {
                    trigram: trigram.to_string(),
                    kind: meta.kind.as_str().to_string(),
                    position,
                });
            }
            if trigrams[..position].contains(trigram) {
                return Err(CompositionError::Duplicate(trigram.to_string()));
            }
        }
        Ok(())
    }

    /// Report codes in already-coded records that this table does not accept.
    /// Nothing is rejected; the caller decides what to do with the findings.
    pub fn audit(&self, records: &[CodedEvent]) -> Vec<AuditFinding> {
        let mut findings = Vec::new();
        for (idx, record) in records.iter().enumerate() {
            let mut report = |field: &str, code: String, problem: String| {
                findings.push(AuditFinding {
                    record: idx,
                    sentence_id: record.sentence_id.clone(),
                    field: field.to_string(),
                    code,
                    problem,
                });
            };

            if !self.contains_event(&record.event_code) {
                report(
                    "event_code",
                    record.event_code.to_string(),
                    "unknown event code".into(),
                );
            }
            if let Err(e) = self.validate_actor(&record.source) {
                report("source", record.source.to_string(), e.to_string());
            }
            if let Some(target) = &record.target {
                if let Err(e) = self.validate_actor(target) {
                    report("target", target.to_string(), e.to_string());
                }
            }
        }
        findings
    }
}

// =============================================================================
// Tests
// =============================================================================
