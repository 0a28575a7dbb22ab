//! Matcher: actor phrases and compound groups
//!
//! 1. Collect every actor and agent pattern hit in the sentence.
//! 2. Pick non-overlapping hits greedily by the configured span rules.
//! 3. Glue neighbouring hits into phrases (`the`, `of`, `'s` may sit between).
//!    A phrase is coded as its best actor, date-resolved, plus at most one agent.
//! 4. Join phrases separated only by conjunctions into compound groups.
//!
//! Capitalised words no hit covers are kept as unresolved spans so the
//! resolver can still bind a placeholder actor to them.

use chrono::NaiveDate;
use lasso::Spur;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::precedence::{rank_spans, spans_tied};
use super::record::Diagnostic;
use crate::codes::{ActorCode, CodeTable};
use crate::config::CoderConfig;
use crate::dictionary::{DateResolution, Dictionary, MatchBudget, MatchCandidate, NounEntry, Tier, VerbOccurrence};
use crate::text::Token;

// =============================================================================
// Types
// =============================================================================

/// One actor mention: a coded phrase or an unresolved capitalised run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// `None` for unresolved spans and phrases with no usable code
    pub code: Option<ActorCode>,
    pub group: usize,
    pub is_compound_member: bool,
    /// Needs a placeholder actor if bound to an event
    pub placeholder: bool,
}

/// Spans joined by conjunctions: "Russia and China".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorGroup {
    pub start: usize,
    pub end: usize,
    /// Indexes into [`Annotation::spans`]
    pub members: Vec<usize>,
}

impl ActorGroup {
    pub fn is_compound(&self) -> bool {
        self.members.len() > 1
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Annotation {
    pub spans: Vec<ActorSpan>,
    pub groups: Vec<ActorGroup>,
    pub diagnostics: Vec<Diagnostic>,
    /// `(end, resume)` token pairs where a conjunction opens a new clause:
    /// "Russia met China and Syria criticized France" splits after "China"
    /// and resumes at "Syria".
    pub clause_splits: Vec<(usize, usize)>,
}

impl Annotation {
    /// Whether any coded phrase overlaps tokens `[start, end)`.
    pub fn covers(&self, start: usize, end: usize) -> bool {
        self.spans
            .iter()
            .any(|s| !s.placeholder && s.start < end && start < s.end)
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &ActorSpan> {
        self.spans.iter().filter(|s| s.placeholder)
    }

    /// Whether any member of group `g` carries a code.
    pub fn group_has_code(&self, g: usize) -> bool {
        self.groups.get(g).is_some_and(|group| {
            group
                .members
                .iter()
                .any(|&m| self.spans.get(m).is_some_and(|s| s.code.is_some()))
        })
    }

    /// Group whose span starts exactly at `token`.
    pub fn group_starting_at(&self, token: usize) -> Option<usize> {
        self.groups.iter().position(|g| g.start == token)
    }
}

/// Selected hits that read as one actor.
struct Phrase {
    start: usize,
    end: usize,
    hits: Vec<MatchCandidate>,
}

// =============================================================================
// Matcher
// =============================================================================

pub struct Matcher<'a> {
    dictionary: &'a Dictionary,
    table: &'a CodeTable,
    config: &'a CoderConfig,
}

impl<'a> Matcher<'a> {
    pub fn new(dictionary: &'a Dictionary, table: &'a CodeTable, config: &'a CoderConfig) -> Self {
        Self {
            dictionary,
            table,
            config,
        }
    }

    /// Annotate a tokenized sentence on its own, locating verbs internally.
    pub fn annotate(&self, tokens: &[Token], date: NaiveDate) -> Annotation {
        let keys = self.dictionary.keys(tokens);
        let norms: Vec<&str> = tokens.iter().map(|t| t.norm.as_str()).collect();
        let verbs = self.dictionary.verbs.locate(&norms);
        let mut budget = MatchBudget::new(self.config.match_budget);
        self.annotate_with(tokens, &keys, &verbs, date, &mut budget)
    }

    pub fn annotate_with(
        &self,
        tokens: &[Token],
        keys: &[Option<Spur>],
        verbs: &[VerbOccurrence],
        date: NaiveDate,
        budget: &mut MatchBudget,
    ) -> Annotation {
        let mut diagnostics = Vec::new();

        let candidates = self.dictionary.match_keys(keys, budget);
        if budget.is_exhausted() {
            warn!(tokens = tokens.len(), "match budget exhausted while matching nouns");
            diagnostics.push(Diagnostic::BudgetExhausted {
                stage: "nouns".into(),
            });
        }

        let selected = self.select(candidates, tokens, &mut diagnostics);
        let phrases = self.phrases(selected, tokens);

        // Coded phrases and unresolved runs, in text order
        let mut spans: Vec<ActorSpan> = phrases
            .iter()
            .map(|p| self.code_phrase(p, tokens, date, &mut diagnostics))
            .collect();
        for (start, end) in self.unresolved_runs(tokens, &spans, verbs) {
            let text = join(tokens, start, end);
            if self.config.report_unresolved_actors {
                diagnostics.push(Diagnostic::UnresolvedActor {
                    text: text.clone(),
                    start,
                    end,
                });
            }
            spans.push(ActorSpan {
                start,
                end,
                text,
                code: None,
                group: 0,
                is_compound_member: false,
                placeholder: true,
            });
        }
        spans.sort_by_key(|s| s.start);

        let (groups, clause_splits) = self.group(&mut spans, tokens, verbs);
        debug!(spans = spans.len(), groups = groups.len(), "sentence annotated");

        Annotation {
            spans,
            groups,
            diagnostics,
            clause_splits,
        }
    }

    /// Greedy non-overlapping selection by rank.
    fn select(
        &self,
        mut candidates: Vec<MatchCandidate>,
        tokens: &[Token],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<MatchCandidate> {
        let rules = &self.config.span_rules;
        candidates.sort_by(|a, b| rank_spans(rules, a, b));

        let mut selected: Vec<MatchCandidate> = Vec::new();
        for candidate in candidates {
            match selected.iter().find(|s| s.overlaps(&candidate)) {
                None => selected.push(candidate),
                Some(winner) => {
                    let same_span = winner.start == candidate.start && winner.end == candidate.end;
                    if same_span && winner.entry != candidate.entry && spans_tied(rules, winner, &candidate) {
                        let chosen = self.entry_name(winner);
                        let rejected = self.entry_name(&candidate);
                        warn!(%chosen, %rejected, "noun precedence tie settled by dictionary order");
                        diagnostics.push(Diagnostic::PrecedenceTie {
                            text: join(tokens, candidate.start, candidate.end),
                            chosen,
                            rejected,
                        });
                    }
                }
            }
        }
        selected.sort_by_key(|s| s.start);
        selected
    }

    fn phrases(&self, selected: Vec<MatchCandidate>, tokens: &[Token]) -> Vec<Phrase> {
        let mut phrases: Vec<Phrase> = Vec::new();
        for hit in selected {
            match phrases.last_mut() {
                Some(phrase) if self.only(tokens, phrase.end, hit.start, |n| self.config.is_glue(n)) => {
                    phrase.end = phrase.end.max(hit.end);
                    phrase.hits.push(hit);
                }
                _ => phrases.push(Phrase {
                    start: hit.start,
                    end: hit.end,
                    hits: vec![hit],
                }),
            }
        }
        phrases
    }

    /// Head actor plus at most one agent.
    fn code_phrase(
        &self,
        phrase: &Phrase,
        tokens: &[Token],
        date: NaiveDate,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ActorSpan {
        let rules = &self.config.span_rules;
        let text = join(tokens, phrase.start, phrase.end);

        let best_of = |tier: Tier| -> Vec<&MatchCandidate> {
            let mut hits: Vec<&MatchCandidate> = phrase.hits.iter().filter(|h| h.tier == tier).collect();
            hits.sort_by(|a, b| rank_spans(rules, a, b));
            hits
        };
        let actors = best_of(Tier::Actor);
        let agents = best_of(Tier::Agent);

        let head = actors
            .first()
            .and_then(|hit| self.resolve_hit(hit, date, diagnostics));

        if agents.len() > 1 {
            let kept = self.entry_name(agents[0]);
            let dropped: Vec<String> = agents[1..].iter().map(|a| self.entry_name(a)).collect();
            warn!(phrase = %text, %kept, "multiple agents in one phrase, keeping the best");
            diagnostics.push(Diagnostic::AgentsNotCombined {
                phrase: text.clone(),
                kept,
                dropped,
            });
        }
        let agent = agents
            .first()
            .and_then(|hit| self.resolve_hit(hit, date, diagnostics));

        let code = match (head, agent) {
            (Some(head), Some(agent)) => Some(self.combine(head, &agent, diagnostics)),
            (Some(head), None) => Some(head),
            (None, Some(agent)) => Some(agent),
            (None, None) => None,
        };

        ActorSpan {
            start: phrase.start,
            end: phrase.end,
            text,
            placeholder: code.is_none(),
            code,
            group: 0,
            is_compound_member: false,
        }
    }

    /// Append an agent fragment to an actor, falling back to the actor alone
    /// when the result is not a valid composition.
    fn combine(&self, head: ActorCode, agent: &ActorCode, diagnostics: &mut Vec<Diagnostic>) -> ActorCode {
        let combined = head
            .append_fragment(agent)
            .and_then(|c| self.table.validate_actor(&c).map(|_| c));
        match combined {
            Ok(code) => code,
            Err(e) => {
                let attempted = format!("{}{}", head, agent);
                warn!(code = %attempted, reason = %e, "agent not applied");
                diagnostics.push(Diagnostic::InvalidComposition {
                    code: attempted,
                    reason: e.to_string(),
                });
                head
            }
        }
    }

    fn resolve_hit(
        &self,
        hit: &MatchCandidate,
        date: NaiveDate,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<ActorCode> {
        let entry = self.dictionary.noun_entry(hit.tier, hit.entry)?;
        resolve_entry(entry, date, self.config.assume_role_persists, diagnostics)
    }

    /// Capitalised runs outside coded phrases and verbs.
    fn unresolved_runs(&self, tokens: &[Token], spans: &[ActorSpan], verbs: &[VerbOccurrence]) -> Vec<(usize, usize)> {
        let candidate = |i: usize| {
            let token = &tokens[i];
            token.is_capitalized()
                && !spans.iter().any(|s| s.start <= i && i < s.end)
                && !verbs.iter().any(|v| v.start <= i && i < v.end)
                && !self.is_function_word(&token.norm)
                && !self.config.is_non_actor(&token.norm)
        };

        let mut runs = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if !candidate(i) {
                i += 1;
                continue;
            }
            let start = i;
            while i < tokens.len() && candidate(i) {
                i += 1;
            }
            // A lone capital at the start of a sentence is not evidence of a name
            if !(start == 0 && i == 1) {
                runs.push((start, i));
            }
        }
        runs
    }

    /// Assign spans to groups; spans separated only by conjunctions share one.
    ///
    /// A span never joins when it is the subject of its own verb while the
    /// group already follows one; that conjunction is returned as a clause
    /// split instead. Unresolved spans do not join across a bare comma.
    fn group(
        &self,
        spans: &mut [ActorSpan],
        tokens: &[Token],
        verbs: &[VerbOccurrence],
    ) -> (Vec<ActorGroup>, Vec<(usize, usize)>) {
        let free_verbs: Vec<&VerbOccurrence> = verbs
            .iter()
            .filter(|v| !spans.iter().any(|s| !s.placeholder && s.start < v.end && v.start < s.end))
            .collect();

        let mut groups: Vec<ActorGroup> = Vec::new();
        let mut splits = Vec::new();
        for idx in 0..spans.len() {
            let (start, end) = (spans[idx].start, spans[idx].end);
            let joins = match groups.last() {
                Some(g) if start > g.end && self.only(tokens, g.end, start, |n| self.config.is_conjunction(n)) => {
                    let last_placeholder = g.members.last().is_some_and(|&m| spans[m].placeholder);
                    let comma_only = self.only(tokens, g.end, start, |n| n == ",");
                    let new_subject = free_verbs.iter().any(|v| v.end <= g.start)
                        && free_verbs.iter().any(|v| v.start == end);
                    if new_subject {
                        splits.push((g.end, start));
                        false
                    } else {
                        !(comma_only && (last_placeholder || spans[idx].placeholder))
                    }
                }
                _ => false,
            };
            match groups.last_mut() {
                Some(group) if joins => {
                    group.end = end;
                    group.members.push(idx);
                }
                _ => groups.push(ActorGroup {
                    start,
                    end,
                    members: vec![idx],
                }),
            }
            spans[idx].group = groups.len() - 1;
        }
        for group in groups.iter().filter(|g| g.is_compound()) {
            for &member in &group.members {
                spans[member].is_compound_member = true;
            }
        }
        (groups, splits)
    }

    /// Every token in `[from, to)` satisfies `pred`; an empty range counts.
    fn only(&self, tokens: &[Token], from: usize, to: usize, pred: impl Fn(&str) -> bool) -> bool {
        (from..to).all(|i| tokens.get(i).is_some_and(|t| pred(&t.norm)))
    }

    fn is_function_word(&self, norm: &str) -> bool {
        self.config.is_glue(norm)
            || self.config.is_conjunction(norm)
            || self.config.is_infinitive_marker(norm)
            || self.config.is_clause_break(norm)
    }

    fn entry_name(&self, hit: &MatchCandidate) -> String {
        self.dictionary
            .noun_entry(hit.tier, hit.entry)
            .map(|e| e.name.clone())
            .unwrap_or_default()
    }
}

/// Resolve an entry's code for a date, noting persistence and gaps.
pub fn resolve_entry(
    entry: &NounEntry,
    date: NaiveDate,
    persist: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<ActorCode> {
    match entry.codes.resolve(date, persist) {
        DateResolution::Active(code) | DateResolution::Default(code) => Some(code.clone()),
        DateResolution::Persisted(code) => {
            diagnostics.push(Diagnostic::PersistedRestriction {
                entry: entry.name.clone(),
                date,
                code: code.to_string(),
            });
            Some(code.clone())
        }
        DateResolution::NoCoverage => {
            let prefix = entry.codes.stable_prefix();
            debug!(entry = %entry.name, %date, "no date restriction covers sentence date");
            diagnostics.push(Diagnostic::NoDateCoverage {
                entry: entry.name.clone(),
                date,
                coded: prefix.as_ref().map(|c| c.to_string()),
            });
            prefix
        }
    }
}

fn join(tokens: &[Token], start: usize, end: usize) -> String {
    tokens[start..end.min(tokens.len())]
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Tests
// =============================================================================
