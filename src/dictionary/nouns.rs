//! Actor and agent dictionaries
//!
//! ```text
//! # actors
//! @GOV
//! ISRAELI_LABOR_PARTY [ISRGOV 19920713-19960617] [ISROPP 19960618-19990517]
//! +LABOR_PARTY
//! REAGAN [USAELI] [USAGOV 810120-890120]
//! * MINISTER_OF_DEFENSE [GOVMIL]
//! ```
//!
//! `@SECTION` switches the sub-dictionary, `+PATTERN` adds a synonym to the
//! entry above it, and each entry carries one or more (optionally dated) code
//! fragments. A `~` before a code is accepted and ignored; agent files often
//! use it to mark fragments.

use lasso::{Rodeo, Spur};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::dates::{DateRange, DateRestrictions};
use super::pattern::{parse_pattern, split_line, CodeGroup, LexError, PatternMode, RawAtom, RawUnit};
use super::trie::{TokenTrie, TrieKey, Terminal};
use super::{LoadOptions, MatchBudget};
use crate::codes::{ActorCode, CodeTable};
use crate::error::{CompositionError, DictionaryError, SyntaxErrorKind};

// =============================================================================
// Types
// =============================================================================

/// Actor entries name who acts; agent entries qualify them.
/// Actors sort before agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Actor,
    Agent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubDictionary {
    Generic,
    Gov,
    Mil,
    Opp,
    Reb,
    Religion,
    Ethnicity,
}

impl SubDictionary {
    fn from_section(name: &str) -> Option<Self> {
        Some(match name.to_uppercase().as_str() {
            "GENERIC" => Self::Generic,
            "GOV" => Self::Gov,
            "MIL" => Self::Mil,
            "OPP" => Self::Opp,
            "REB" => Self::Reb,
            "RELIGION" => Self::Religion,
            "ETHNICITY" | "ETHNIC" => Self::Ethnicity,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NounEntry {
    pub name: String,
    pub tier: Tier,
    pub sub: SubDictionary,
    pub codes: DateRestrictions,
    pub source: String,
    pub line: usize,
}

/// One pattern hit over a token span `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub tier: Tier,
    pub sub: SubDictionary,
    pub entry: usize,
    pub start: usize,
    pub end: usize,
    pub literal_len: usize,
    pub order: usize,
}

impl MatchCandidate {
    pub fn span_len(&self) -> usize {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &MatchCandidate) -> bool {
        self.start < other.end && other.start < self.end
    }
}

// =============================================================================
// NounDictionary
// =============================================================================

#[derive(Debug, Clone)]
pub struct NounDictionary {
    tier: Tier,
    entries: Vec<NounEntry>,
    trie: TokenTrie,
}

impl NounDictionary {
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            entries: Vec::new(),
            trie: TokenTrie::new(),
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pattern_count(&self) -> usize {
        self.trie.len()
    }

    pub fn entry(&self, idx: usize) -> Option<&NounEntry> {
        self.entries.get(idx)
    }

    pub fn entries(&self) -> &[NounEntry] {
        &self.entries
    }

    /// Parse one dictionary file into this tier. `order` is the running
    /// pattern counter shared by every file of the snapshot.
    pub fn load(
        &mut self,
        source_name: &str,
        text: &str,
        rodeo: &mut Rodeo,
        table: &CodeTable,
        options: &LoadOptions,
        order: &mut usize,
    ) -> Result<usize, DictionaryError> {
        let mut sub = SubDictionary::Generic;
        let mut last_entry: Option<usize> = None;
        let before = self.entries.len();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let at = |e: LexError| DictionaryError::new(source_name, line_no, e.column, e.kind);

            let lead = raw.len() - raw.trim_start().len();
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(section) = line.strip_prefix('@') {
                let name = section.split_whitespace().next().unwrap_or("");
                sub = SubDictionary::from_section(name).ok_or_else(|| {
                    DictionaryError::new(
                        source_name,
                        line_no,
                        lead + 1,
                        SyntaxErrorKind::UnknownSection(name.to_string()),
                    )
                })?;
                continue;
            }

            if let Some(synonym) = line.strip_prefix('+') {
                let entry = last_entry.ok_or_else(|| {
                    DictionaryError::new(source_name, line_no, lead + 1, SyntaxErrorKind::OrphanSynonym)
                })?;
                let split = split_line(synonym, lead + 1).map_err(at)?;
                if let Some(group) = split.codes.first() {
                    return Err(at(LexError {
                        column: group.column,
                        kind: SyntaxErrorKind::MalformedCode(group.text.to_string()),
                    }));
                }
                self.insert_pattern(split.pattern, split.pattern_column, entry, rodeo, order)
                    .map_err(at)?;
                continue;
            }

            let split = split_line(line, lead).map_err(at)?;
            if split.pattern.is_empty() {
                return Err(DictionaryError::new(
                    source_name,
                    line_no,
                    lead + 1,
                    SyntaxErrorKind::EmptyPattern,
                ));
            }
            if split.codes.is_empty() {
                return Err(DictionaryError::new(
                    source_name,
                    line_no,
                    lead + line.len() + 1,
                    SyntaxErrorKind::MissingCode,
                ));
            }

            let mut codes = DateRestrictions::default();
            for group in &split.codes {
                let (code, range) = parse_code_group(group, table, options.year_pivot).map_err(at)?;
                if let Err(kind) = codes.push(code, range) {
                    let overlap = matches!(kind, SyntaxErrorKind::OverlappingRestriction(_));
                    if overlap && !options.strict_date_overlaps {
                        warn!(
                            source = source_name,
                            line = line_no,
                            fragment = group.text,
                            "overlapping date restriction dropped"
                        );
                        continue;
                    }
                    return Err(at(LexError {
                        column: group.column,
                        kind,
                    }));
                }
            }

            let entry = self.entries.len();
            self.entries.push(NounEntry {
                name: split.pattern.replace('_', " "),
                tier: self.tier,
                sub,
                codes,
                source: source_name.to_string(),
                line: line_no,
            });
            self.insert_pattern(split.pattern, split.pattern_column, entry, rodeo, order)
                .map_err(at)?;
            last_entry = Some(entry);
        }

        let added = self.entries.len() - before;
        debug!(source = source_name, tier = ?self.tier, entries = added, "noun dictionary loaded");
        Ok(added)
    }

    fn insert_pattern(
        &mut self,
        pattern: &str,
        column: usize,
        entry: usize,
        rodeo: &mut Rodeo,
        order: &mut usize,
    ) -> Result<(), LexError> {
        let units = parse_pattern(pattern, column, PatternMode::Noun)?;
        let atoms: Vec<&RawAtom> = units
            .iter()
            .flat_map(|u| match u {
                RawUnit::Run(atoms) => atoms.iter().collect::<Vec<_>>(),
                _ => Vec::new(),
            })
            .collect();

        let sequences = expand(&atoms, rodeo);
        for keys in sequences {
            let literal_len = keys.iter().filter(|k| matches!(k, TrieKey::Word(_))).count();
            if literal_len == 0 {
                return Err(LexError {
                    column,
                    kind: SyntaxErrorKind::EmptyPattern,
                });
            }
            self.trie.insert(
                &keys,
                Terminal {
                    entry,
                    literal_len,
                    order: *order,
                },
            );
        }
        *order += 1;
        Ok(())
    }

    /// Every pattern hit in the sentence, all start positions.
    pub fn match_keys(&self, keys: &[Option<Spur>], budget: &mut MatchBudget) -> Vec<MatchCandidate> {
        let mut hits = Vec::new();
        let mut out = Vec::new();
        for start in 0..keys.len() {
            hits.clear();
            self.trie.matches_at(keys, start, budget, &mut hits);
            for hit in &hits {
                let Some(entry) = self.entries.get(hit.terminal.entry) else {
                    continue;
                };
                out.push(MatchCandidate {
                    tier: self.tier,
                    sub: entry.sub,
                    entry: hit.terminal.entry,
                    start,
                    end: hit.end,
                    literal_len: hit.terminal.literal_len,
                    order: hit.terminal.order,
                });
            }
            if budget.is_exhausted() {
                break;
            }
        }
        out
    }
}

/// Cartesian product of alternation groups into plain key sequences.
fn expand(atoms: &[&RawAtom], rodeo: &mut Rodeo) -> Vec<Vec<TrieKey>> {
    let mut sequences: Vec<Vec<TrieKey>> = vec![Vec::new()];
    for atom in atoms {
        match atom {
            RawAtom::Word(word) => {
                let key = TrieKey::Word(rodeo.get_or_intern(word));
                sequences.iter_mut().for_each(|s| s.push(key));
            }
            RawAtom::Star => sequences.iter_mut().for_each(|s| s.push(TrieKey::Any)),
            RawAtom::Choice(alternatives) => {
                let mut next = Vec::with_capacity(sequences.len() * alternatives.len());
                for seq in &sequences {
                    for alt in alternatives {
                        let mut extended = seq.clone();
                        extended.extend(alt.iter().map(|w| TrieKey::Word(rodeo.get_or_intern(w))));
                        next.push(extended);
                    }
                }
                sequences = next;
            }
        }
    }
    sequences
}

/// `CODE`, `~CODE` or `CODE DATES`.
fn parse_code_group(
    group: &CodeGroup<'_>,
    table: &CodeTable,
    year_pivot: u32,
) -> Result<(ActorCode, Option<DateRange>), LexError> {
    let fail = |kind| LexError {
        column: group.column,
        kind,
    };
    let mut parts = group.text.split_whitespace();
    let raw_code = parts.next().ok_or_else(|| fail(SyntaxErrorKind::MissingCode))?;
    let code_text = raw_code.trim_start_matches('~');
    let code = ActorCode::parse(code_text)
        .map_err(|_| fail(SyntaxErrorKind::MalformedCode(raw_code.to_string())))?;

    table.validate_actor(&code).map_err(|e| match e {
        CompositionError::UnknownTrigram(t) => fail(SyntaxErrorKind::UnknownCode(t)),
        other => fail(SyntaxErrorKind::InvalidComposition {
            code: code.to_string(),
            reason: other.to_string(),
        }),
    })?;

    let range = match parts.next() {
        Some(dates) => Some(DateRange::parse(dates, year_pivot).map_err(fail)?),
        None => None,
    };
    if let Some(extra) = parts.next() {
        return Err(fail(SyntaxErrorKind::MalformedDate(extra.to_string())));
    }
    Ok((code, range))
}

// =============================================================================
// Tests
// =============================================================================
