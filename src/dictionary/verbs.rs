//! Verb dictionary: headwords, their surface forms and event patterns
//!
//! ```text
//! ASK
//! - {WILL|WOULD|IS_TO} * + TO HELP FINANCE [0231]
//! AGREE [019:019]
//! MEET {MET} [036]
//! SIGN [057]
//! - % * MILITARY ACCORD [062:062]
//! ```
//!
//! A headword line names the lemma, optional extra forms in braces and an
//! optional default code. `- PATTERN [CODE]` lines below it add event
//! patterns. `*` marks where the verb sits (a pattern without one has the
//! verb in front), `$` and `+` pin the source and target slots, `%` asks for
//! the members of a compound source to be paired with each other.
//!
//! Codes: `[c]` single (reciprocal if the code table marks `c` symmetric),
//! `[c:c]` reciprocal, `[a:b]` linked pair, `[---]` recognised but not coded.
//!
//! Surface forms are located with one Aho-Corasick automaton over all
//! conjugated forms; `pattern_meta` maps automaton pattern ids back to entries.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use lasso::{Rodeo, Spur};
use std::collections::HashMap;
use tracing::debug;

use super::morphology::conjugate;
use super::pattern::{parse_pattern, split_line, word_keys, CodeGroup, LexError, PatternMode, RawAtom, RawUnit};
use crate::codes::{CodeTable, EventCode};
use crate::error::{CoderError, DictionaryError, SyntaxErrorKind};

// =============================================================================
// Types
// =============================================================================

/// What a matched pattern emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    Single(EventCode),
    /// Coded in both directions
    Reciprocal(EventCode),
    /// `forward` for source → target, `reverse` for target → source
    Linked { forward: EventCode, reverse: EventCode },
    Suppressed,
}

impl Emission {
    /// The code of the forward event, if any.
    pub fn primary(&self) -> Option<&EventCode> {
        match self {
            Self::Single(c) | Self::Reciprocal(c) => Some(c),
            Self::Linked { forward, .. } => Some(forward),
            Self::Suppressed => None,
        }
    }

    pub fn is_reciprocal(&self) -> bool {
        matches!(self, Self::Reciprocal(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    Word(Spur),
    Choice(Vec<Vec<Spur>>),
    /// Where the located verb must sit
    Verb,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// Contiguous atoms
    Run(Vec<Atom>),
    Source,
    Target,
}

#[derive(Debug, Clone)]
pub struct VerbPattern {
    pub text: String,
    pub elements: Vec<Element>,
    pub emission: Emission,
    /// `%`: pair up the members of a compound source
    pub compound: bool,
    /// Literal words the pattern requires (shortest alternative for groups)
    pub literal_len: usize,
    pub line: usize,
    pub order: usize,
}

impl VerbPattern {
    /// Literal words plus one for the verb itself.
    pub fn specificity(&self) -> usize {
        self.literal_len + 1
    }
}

#[derive(Debug, Clone)]
pub struct VerbEntry {
    pub lemma: String,
    /// Space-joined token norms of every surface form
    pub forms: Vec<String>,
    pub default: Option<Emission>,
    pub patterns: Vec<VerbPattern>,
    pub source: String,
    pub line: usize,
    pub order: usize,
}

/// A located verb over tokens `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbOccurrence {
    pub entry: usize,
    pub start: usize,
    pub end: usize,
}

// =============================================================================
// VerbDictionary
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct VerbDictionary {
    entries: Vec<VerbEntry>,
    automaton: Option<AhoCorasick>,
    /// Automaton pattern id → entry index
    pattern_meta: Vec<usize>,
    pending_forms: Vec<String>,
    needs_rebuild: bool,
}

impl VerbDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, idx: usize) -> Option<&VerbEntry> {
        self.entries.get(idx)
    }

    pub fn entries(&self) -> &[VerbEntry] {
        &self.entries
    }

    pub fn pattern_count(&self) -> usize {
        self.entries.iter().map(|e| e.patterns.len()).sum()
    }

    pub fn form_count(&self) -> usize {
        self.pattern_meta.len()
    }

    pub fn load(
        &mut self,
        source_name: &str,
        text: &str,
        rodeo: &mut Rodeo,
        table: &CodeTable,
        order: &mut usize,
    ) -> Result<usize, DictionaryError> {
        let mut current: Option<usize> = None;
        let before = self.entries.len();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let at = |e: LexError| DictionaryError::new(source_name, line_no, e.column, e.kind);

            let lead = raw.len() - raw.trim_start().len();
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(body) = line.strip_prefix('-').filter(|b| b.starts_with(char::is_whitespace)) {
                let entry = current.ok_or_else(|| {
                    DictionaryError::new(source_name, line_no, lead + 1, SyntaxErrorKind::OrphanPattern)
                })?;
                let pattern = self
                    .parse_verb_pattern(body, lead + 1, line_no, rodeo, table, *order)
                    .map_err(at)?;
                *order += 1;
                self.entries[entry].patterns.push(pattern);
                continue;
            }

            let entry = self.parse_headword(line, lead, line_no, source_name, table, *order).map_err(at)?;
            *order += 1;
            current = Some(self.entries.len());
            self.add_entry(entry);
        }

        let added = self.entries.len() - before;
        debug!(source = source_name, entries = added, "verb dictionary loaded");
        Ok(added)
    }

    fn add_entry(&mut self, entry: VerbEntry) {
        let idx = self.entries.len();
        for form in &entry.forms {
            self.pattern_meta.push(idx);
            self.pending_forms.push(form.clone());
        }
        self.entries.push(entry);
        self.needs_rebuild = true;
    }

    fn parse_headword(
        &self,
        line: &str,
        lead: usize,
        line_no: usize,
        source_name: &str,
        table: &CodeTable,
        order: usize,
    ) -> Result<VerbEntry, LexError> {
        let split = split_line(line, lead)?;
        let (lemma, explicit) = match split.pattern.find('{') {
            Some(open) => {
                let close = split.pattern[open..].find('}').map(|c| open + c).ok_or(LexError {
                    column: split.pattern_column + open,
                    kind: SyntaxErrorKind::Unbalanced('{'),
                })?;
                let inner = &split.pattern[open + 1..close];
                let forms: Vec<&str> = inner
                    .split(|c: char| c == '|' || c == ',' || c.is_whitespace())
                    .filter(|f| !f.is_empty())
                    .collect();
                (split.pattern[..open].trim(), forms)
            }
            None => (split.pattern, Vec::new()),
        };
        if lemma.is_empty() {
            return Err(LexError {
                column: split.pattern_column,
                kind: SyntaxErrorKind::EmptyPattern,
            });
        }

        let default = match split.codes.as_slice() {
            [] => None,
            [group] => Some(parse_emission(group, table)?),
            [_, extra, ..] => {
                return Err(LexError {
                    column: extra.column,
                    kind: SyntaxErrorKind::MalformedCode(extra.text.to_string()),
                })
            }
        };

        let mut forms: Vec<String> = Vec::new();
        for form in conjugate(lemma).iter().map(String::as_str).chain(explicit) {
            let key = form_key(form);
            if !key.is_empty() && !forms.contains(&key) {
                forms.push(key);
            }
        }

        Ok(VerbEntry {
            lemma: lemma.replace('_', " ").to_uppercase(),
            forms,
            default,
            patterns: Vec::new(),
            source: source_name.to_string(),
            line: line_no,
            order,
        })
    }

    fn parse_verb_pattern(
        &self,
        body: &str,
        offset: usize,
        line_no: usize,
        rodeo: &mut Rodeo,
        table: &CodeTable,
        order: usize,
    ) -> Result<VerbPattern, LexError> {
        let split = split_line(body, offset)?;
        let group = match split.codes.as_slice() {
            [group] => group,
            [] => {
                return Err(LexError {
                    column: offset + body.len() + 1,
                    kind: SyntaxErrorKind::MissingCode,
                })
            }
            [_, extra, ..] => {
                return Err(LexError {
                    column: extra.column,
                    kind: SyntaxErrorKind::MalformedCode(extra.text.to_string()),
                })
            }
        };
        let emission = parse_emission(group, table)?;
        let units = parse_pattern(split.pattern, split.pattern_column, PatternMode::Verb)?;

        let mut compound = false;
        let mut has_verb = false;
        let mut literal_len = 0;
        let mut elements = Vec::with_capacity(units.len() + 1);
        for unit in units {
            match unit {
                RawUnit::Compound => compound = true,
                RawUnit::Source => elements.push(Element::Source),
                RawUnit::Target => elements.push(Element::Target),
                RawUnit::Run(raw) => {
                    let atoms: Vec<Atom> = raw
                        .into_iter()
                        .map(|atom| match atom {
                            RawAtom::Word(w) => {
                                literal_len += 1;
                                Atom::Word(rodeo.get_or_intern(w))
                            }
                            RawAtom::Choice(alts) => {
                                literal_len += alts.iter().map(Vec::len).min().unwrap_or(0);
                                Atom::Choice(
                                    alts.iter()
                                        .map(|alt| alt.iter().map(|w| rodeo.get_or_intern(w)).collect())
                                        .collect(),
                                )
                            }
                            RawAtom::Star => {
                                has_verb = true;
                                Atom::Verb
                            }
                        })
                        .collect();
                    elements.push(Element::Run(atoms));
                }
            }
        }
        if !has_verb {
            elements.insert(0, Element::Run(vec![Atom::Verb]));
        }

        Ok(VerbPattern {
            text: split.pattern.to_string(),
            elements,
            emission,
            compound,
            literal_len,
            line: line_no,
            order,
        })
    }

    /// Compile the surface-form automaton.
    pub fn build(&mut self) -> Result<(), CoderError> {
        if !self.needs_rebuild {
            return Ok(());
        }
        if self.pending_forms.is_empty() {
            self.automaton = None;
            self.needs_rebuild = false;
            return Ok(());
        }
        // Standard semantics so every overlapping form is seen; the longest
        // aligned one per start is picked in `locate`
        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .ascii_case_insensitive(true)
            .build(&self.pending_forms)
            .map_err(|e| CoderError::Automaton(e.to_string()))?;
        self.automaton = Some(automaton);
        self.needs_rebuild = false;
        Ok(())
    }

    /// Find verb forms over token norms, aligned to token boundaries, keeping
    /// the longest form at each start (earliest entry on equal length).
    pub fn locate(&self, norms: &[&str]) -> Vec<VerbOccurrence> {
        let Some(automaton) = &self.automaton else {
            return Vec::new();
        };

        let mut haystack = String::new();
        let mut starts: HashMap<usize, usize> = HashMap::new();
        let mut ends: HashMap<usize, usize> = HashMap::new();
        for (i, norm) in norms.iter().enumerate() {
            if i > 0 {
                haystack.push(' ');
            }
            starts.insert(haystack.len(), i);
            haystack.push_str(norm);
            ends.insert(haystack.len(), i + 1);
        }

        let mut best: HashMap<usize, VerbOccurrence> = HashMap::new();
        for mat in automaton.find_overlapping_iter(&haystack) {
            let (Some(&start), Some(&end)) = (starts.get(&mat.start()), ends.get(&mat.end())) else {
                continue;
            };
            let Some(&entry) = self.pattern_meta.get(mat.pattern().as_usize()) else {
                continue;
            };
            let candidate = VerbOccurrence { entry, start, end };
            best.entry(start)
                .and_modify(|current| {
                    if end > current.end || (end == current.end && entry < current.entry) {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }

        let mut found: Vec<VerbOccurrence> = best.into_values().collect();
        found.sort_by_key(|o| o.start);
        found
    }
}

/// Normalize a written form the way sentence tokens are normalized.
fn form_key(form: &str) -> String {
    form.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .flat_map(word_keys)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `[c]`, `[c:c]`, `[a:b]` or `[---]`.
fn parse_emission(group: &CodeGroup<'_>, table: &CodeTable) -> Result<Emission, LexError> {
    let fail = |kind| LexError {
        column: group.column,
        kind,
    };
    let text = group.text.trim();
    if text.is_empty() {
        return Err(fail(SyntaxErrorKind::MissingCode));
    }
    if text == "---" {
        return Ok(Emission::Suppressed);
    }
    let event = |s: &str| -> Result<EventCode, LexError> {
        let code = EventCode::parse(s).map_err(|_| fail(SyntaxErrorKind::MalformedCode(s.to_string())))?;
        if !table.contains_event(&code) {
            return Err(fail(SyntaxErrorKind::UnknownCode(s.to_string())));
        }
        Ok(code)
    };
    match text.split_once(':') {
        None => {
            let code = event(text)?;
            Ok(if table.is_symmetric(&code) {
                Emission::Reciprocal(code)
            } else {
                Emission::Single(code)
            })
        }
        Some((a, b)) => {
            let forward = event(a.trim())?;
            let reverse = event(b.trim())?;
            Ok(if forward == reverse {
                Emission::Reciprocal(forward)
            } else {
                Emission::Linked { forward, reverse }
            })
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::tokenize;

    fn load(text: &str) -> (VerbDictionary, Rodeo) {
        let mut rodeo = Rodeo::default();
        let mut dict = VerbDictionary::new();
        let mut order = 0;
        dict.load("verbs.txt", text, &mut rodeo, &CodeTable::builtin(), &mut order)
            .unwrap();
        dict.build().unwrap();
        (dict, rodeo)
    }

    fn load_err(text: &str) -> DictionaryError {
        let mut rodeo = Rodeo::default();
        let mut order = 0;
        VerbDictionary::new()
            .load("verbs.txt", text, &mut rodeo, &CodeTable::builtin(), &mut order)
            .unwrap_err()
    }

    fn locate(dict: &VerbDictionary, text: &str) -> Vec<VerbOccurrence> {
        let tokens = tokenize(text);
        let norms: Vec<&str> = tokens.iter().map(|t| t.norm.as_str()).collect();
        dict.locate(&norms)
    }

    #[test]
    fn test_headword_and_patterns() {
        let (dict, _) = load("ASK\n- {WILL|WOULD|IS_TO} * + TO HELP FINANCE [0231]\nAGREE [019:019]\n");
        assert_eq!(dict.len(), 2);
        let ask = dict.entry(0).unwrap();
        assert!(ask.default.is_none());
        assert_eq!(ask.patterns.len(), 1);
        let pattern = &ask.patterns[0];
        assert_eq!(pattern.literal_len, 4, "shortest alternative plus TO HELP FINANCE");
        assert_eq!(pattern.specificity(), 5);
        assert_eq!(pattern.elements.len(), 6);
        assert!(matches!(pattern.elements[1], Element::Run(ref atoms) if atoms == &vec![Atom::Verb]));

        let agree = dict.entry(1).unwrap();
        assert_eq!(
            agree.default,
            Some(Emission::Reciprocal(EventCode::parse("019").unwrap()))
        );
    }

    #[test]
    fn test_emission_kinds() {
        let (dict, _) = load("SIGN [057]\nPRAISE [051]\nVISIT [042:043]\nSAY [---]\n");
        assert!(dict.entry(0).unwrap().default.as_ref().unwrap().is_reciprocal(), "057 is symmetric");
        assert!(matches!(dict.entry(1).unwrap().default, Some(Emission::Single(_))));
        assert!(matches!(dict.entry(2).unwrap().default, Some(Emission::Linked { .. })));
        assert_eq!(dict.entry(3).unwrap().default, Some(Emission::Suppressed));
    }

    #[test]
    fn test_implicit_verb_anchor_and_compound() {
        let (dict, _) = load("SIGN [057]\n- % * MILITARY ACCORD [062:062]\n- + ACCORD [057]\n");
        let sign = dict.entry(0).unwrap();
        assert!(sign.patterns[0].compound);
        assert_eq!(sign.patterns[1].elements[0], Element::Run(vec![Atom::Verb]));
    }

    #[test]
    fn test_locate_forms() {
        let (dict, _) = load("MEET {MET} [036]\nSIGN [057]\nCALL_FOR [020]\n");
        let found = locate(&dict, "Mubarak met Reagan and signed a pact, calling for calm");
        let entries: Vec<(usize, usize, usize)> = found.iter().map(|o| (o.entry, o.start, o.end)).collect();
        assert_eq!(entries, vec![(0, 1, 2), (1, 4, 5), (2, 8, 10)]);
    }

    #[test]
    fn test_locate_requires_token_boundaries() {
        let (dict, _) = load("SIGN [057]\n");
        assert!(locate(&dict, "the signature was forged").is_empty());
        assert!(locate(&dict, "designed").is_empty());
    }

    #[test]
    fn test_errors() {
        let err = load_err("- * TO [020]\n");
        assert_eq!(err.kind, SyntaxErrorKind::OrphanPattern);

        let err = load_err("ASK\n- * + TO HELP\n");
        assert_eq!((err.line, err.kind), (2, SyntaxErrorKind::MissingCode));

        let err = load_err("ASK [0999]\n");
        assert_eq!(err.kind, SyntaxErrorKind::UnknownCode("0999".into()));

        let err = load_err("ASK [ABC]\n");
        assert_eq!(err.kind, SyntaxErrorKind::MalformedCode("ABC".into()));

        let err = load_err("ASK\n- {WILL|WOULD * [020]\n");
        assert_eq!(err.kind, SyntaxErrorKind::Unbalanced('{'));
        assert_eq!(err.column, 3);
    }
}
