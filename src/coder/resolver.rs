//! Resolver: verb patterns, slot binding and event emission
//!
//! Each located verb (outside actor phrases) is tried against its patterns.
//! A pattern is a sequence of elements matched left to right; after the first
//! element each one may start up to `max_gap` tokens after the previous one
//! ended. The verb anchor must land exactly on the located verb. The best
//! candidate by the verb rules decides the event for the clause.
//!
//! Slots a pattern does not pin are bound by position: the source is the
//! closest group before the verb, the target the first group after it.
//! Groups with a coded member win over unresolved ones on the same side.

use chrono::NaiveDate;
use lasso::Spur;
use smallvec::{smallvec, SmallVec};
use tracing::{debug, warn};

use super::matcher::{ActorGroup, Annotation};
use super::precedence::{rank_verbs, verbs_tied, VerbKey};
use super::record::{ActorSlot, CodedEvent, Diagnostic};
use crate::codes::{ActorCode, CodeTable, EventCode};
use crate::config::CoderConfig;
use crate::dictionary::{Atom, Dictionary, Element, Emission, MatchBudget, VerbEntry, VerbOccurrence, VerbPattern};
use crate::text::Token;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub events: Vec<CodedEvent>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Group indexes pinned by `$` / `+` in a matched pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Slots {
    source: Option<usize>,
    target: Option<usize>,
}

/// A verb reading: one pattern (or the headword default) of one occurrence.
#[derive(Debug, Clone)]
struct VerbCandidate<'d> {
    key: VerbKey,
    occurrence: VerbOccurrence,
    entry: &'d VerbEntry,
    pattern: Option<&'d VerbPattern>,
    slots: Slots,
}

impl VerbCandidate<'_> {
    fn emission(&self) -> Option<&Emission> {
        match self.pattern {
            Some(p) => Some(&p.emission),
            None => self.entry.default.as_ref(),
        }
    }

    fn compound(&self) -> bool {
        self.pattern.is_some_and(|p| p.compound)
    }

    fn label(&self) -> String {
        match self.pattern {
            Some(p) => p.text.clone(),
            None => format!("{} (default)", self.entry.lemma),
        }
    }
}

/// Token positions where a pattern element can end.
type Ends = SmallVec<[usize; 2]>;

/// What a pattern is matched against.
struct Context<'s> {
    keys: &'s [Option<Spur>],
    occurrence: VerbOccurrence,
    annotation: &'s Annotation,
}

// =============================================================================
// Resolver
// =============================================================================

pub struct Resolver<'a> {
    dictionary: &'a Dictionary,
    table: &'a CodeTable,
    config: &'a CoderConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(dictionary: &'a Dictionary, table: &'a CodeTable, config: &'a CoderConfig) -> Self {
        Self {
            dictionary,
            table,
            config,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        &self,
        sentence_id: &str,
        date: NaiveDate,
        tokens: &[Token],
        keys: &[Option<Spur>],
        verbs: &[VerbOccurrence],
        annotation: &Annotation,
        budget: &mut MatchBudget,
    ) -> Resolution {
        let mut out = Resolution::default();

        // Verbs inside actor phrases are part of a name
        let mut occurrences: Vec<VerbOccurrence> = Vec::new();
        for occ in verbs.iter().filter(|v| !annotation.covers(v.start, v.end)) {
            if occurrences.last().map_or(true, |prev| occ.start >= prev.end) {
                occurrences.push(*occ);
            }
        }
        if occurrences.is_empty() {
            out.diagnostics.push(Diagnostic::NoVerb);
            return out;
        }

        let mut candidates: Vec<VerbCandidate<'a>> = Vec::new();
        for occ in &occurrences {
            self.collect_candidates(*occ, tokens, keys, annotation, budget, &mut candidates);
        }
        if budget.is_exhausted() {
            warn!(sentence = sentence_id, "match budget exhausted while matching verb patterns");
            out.diagnostics.push(Diagnostic::BudgetExhausted {
                stage: "verbs".into(),
            });
        }

        let rules = &self.config.verb_rules;
        candidates.sort_by(|a, b| rank_verbs(rules, &a.key, &b.key));
        let Some(winner) = candidates.first() else {
            for occ in &occurrences {
                if let Some(entry) = self.dictionary.verbs.entry(occ.entry) {
                    debug!(verb = %entry.lemma, "verb has no applicable pattern or default");
                    out.diagnostics.push(Diagnostic::UnresolvedVerb {
                        verb: entry.lemma.clone(),
                    });
                }
            }
            return out;
        };

        for rival in candidates[1..]
            .iter()
            .filter(|c| verbs_tied(rules, &winner.key, &c.key))
        {
            warn!(verb = %winner.entry.lemma, chosen = %winner.label(), rejected = %rival.label(), "verb pattern tie");
            out.diagnostics.push(Diagnostic::VerbTie {
                verb: winner.entry.lemma.clone(),
                chosen: winner.label(),
                rejected: rival.label(),
            });
        }

        self.emit(sentence_id, date, winner, annotation, &mut out);
        out
    }

    fn collect_candidates(
        &self,
        occurrence: VerbOccurrence,
        tokens: &[Token],
        keys: &[Option<Spur>],
        annotation: &Annotation,
        budget: &mut MatchBudget,
        out: &mut Vec<VerbCandidate<'a>>,
    ) {
        let Some(entry) = self.dictionary.verbs.entry(occurrence.entry) else {
            return;
        };
        let finite = !(occurrence.start > 0
            && tokens
                .get(occurrence.start - 1)
                .is_some_and(|t| self.config.is_infinitive_marker(&t.norm)));

        let ctx = Context {
            keys,
            occurrence,
            annotation,
        };
        for pattern in &entry.patterns {
            let mut slots = Slots::default();
            if self.match_elements(&pattern.elements, 0, 0, &ctx, &mut slots, budget) {
                out.push(VerbCandidate {
                    key: VerbKey {
                        finite,
                        verb_start: occurrence.start,
                        specificity: pattern.specificity(),
                        order: pattern.order,
                    },
                    occurrence,
                    entry,
                    pattern: Some(pattern),
                    slots,
                });
            }
            if budget.is_exhausted() {
                return;
            }
        }
        if entry.default.is_some() {
            out.push(VerbCandidate {
                key: VerbKey {
                    finite,
                    verb_start: occurrence.start,
                    specificity: 1,
                    order: entry.order,
                },
                occurrence,
                entry,
                pattern: None,
                slots: Slots::default(),
            });
        }
    }

    /// Backtracking match of `elements[idx..]` starting at or after `pos`.
    fn match_elements(
        &self,
        elements: &[Element],
        idx: usize,
        pos: usize,
        ctx: &Context<'_>,
        slots: &mut Slots,
        budget: &mut MatchBudget,
    ) -> bool {
        let Some(element) = elements.get(idx) else {
            return true;
        };
        let len = ctx.keys.len();
        let last = if idx == 0 {
            len.saturating_sub(1)
        } else {
            (pos + self.config.max_gap).min(len)
        };

        for start in pos..=last {
            if !budget.step() {
                return false;
            }
            let saved = *slots;
            // Longest reading first, shorter ones on backtrack
            for end in self.match_element(element, start, ctx, slots) {
                if self.match_elements(elements, idx + 1, end, ctx, slots, budget) {
                    return true;
                }
                if budget.is_exhausted() {
                    return false;
                }
            }
            *slots = saved;
        }
        false
    }

    /// One element at exactly `start`; returns every place it can end,
    /// longest first.
    fn match_element(&self, element: &Element, start: usize, ctx: &Context<'_>, slots: &mut Slots) -> Ends {
        match element {
            Element::Run(atoms) => {
                let mut ends: Ends = smallvec![start];
                for atom in atoms {
                    let mut next: Ends = ends.iter().flat_map(|&at| match_atom(atom, at, ctx)).collect();
                    next.sort_unstable_by(|a, b| b.cmp(a));
                    next.dedup();
                    if next.is_empty() {
                        return next;
                    }
                    ends = next;
                }
                ends
            }
            Element::Source | Element::Target => {
                let Some(group) = ctx.annotation.group_starting_at(start) else {
                    return Ends::new();
                };
                if matches!(element, Element::Source) {
                    slots.source = Some(group);
                } else {
                    slots.target = Some(group);
                }
                smallvec![ctx.annotation.groups[group].end]
            }
        }
    }

    // =========================================================================
    // Emission
    // =========================================================================

    fn emit(
        &self,
        sentence_id: &str,
        date: NaiveDate,
        winner: &VerbCandidate<'_>,
        annotation: &Annotation,
        out: &mut Resolution,
    ) {
        let verb = winner.entry.lemma.clone();
        let Some(emission) = winner.emission() else {
            out.diagnostics.push(Diagnostic::UnresolvedVerb { verb });
            return;
        };
        let (forward, mirror) = match emission {
            Emission::Suppressed => {
                debug!(%verb, "verb recognised but not coded");
                out.diagnostics.push(Diagnostic::Suppressed { verb });
                return;
            }
            Emission::Single(code) => (code.clone(), Mirror::None),
            Emission::Reciprocal(code) => (code.clone(), Mirror::Reciprocal(code.clone())),
            Emission::Linked { forward, reverse } => (forward.clone(), Mirror::Linked(reverse.clone())),
        };

        let occ = winner.occurrence;
        let source_group = winner.slots.source.or_else(|| {
            let before: Vec<usize> = (0..annotation.groups.len())
                .rev()
                .filter(|&g| annotation.groups[g].end <= occ.start)
                .collect();
            nearest(annotation, &before)
        });
        let target_group = winner
            .slots
            .target
            .or_else(|| {
                let after: Vec<usize> = (0..annotation.groups.len())
                    .filter(|&g| annotation.groups[g].start >= occ.end)
                    .collect();
                nearest(annotation, &after)
            })
            .filter(|t| Some(*t) != source_group);

        let Some(source_group) = source_group.map(|g| &annotation.groups[g]) else {
            out.diagnostics.push(Diagnostic::NoSource { verb });
            return;
        };

        let sources = self.slot_codes(source_group, annotation, ActorSlot::Source, &verb, out);
        if sources.is_empty() {
            return;
        }
        let targets: Vec<Option<ActorCode>> = match target_group.map(|g| &annotation.groups[g]) {
            Some(group) => {
                let codes = self.slot_codes(group, annotation, ActorSlot::Target, &verb, out);
                if codes.is_empty() {
                    return;
                }
                codes.into_iter().map(Some).collect()
            }
            None => vec![None],
        };

        let pattern = winner.pattern.map(|p| p.text.clone());
        let make = |source: &ActorCode, target: Option<&ActorCode>, code: &EventCode, reciprocal, linked| CodedEvent {
            sentence_id: sentence_id.to_string(),
            date,
            source: source.clone(),
            target: target.cloned(),
            event_code: code.clone(),
            reciprocal,
            linked,
            pattern: pattern.clone(),
        };
        let push_pair = |a: &ActorCode, b: Option<&ActorCode>, events: &mut Vec<CodedEvent>| {
            events.push(make(a, b, &forward, false, false));
            if let Some(b) = b {
                match &mirror {
                    Mirror::None => {}
                    Mirror::Reciprocal(code) => events.push(make(b, Some(a), code, true, false)),
                    Mirror::Linked(code) => events.push(make(b, Some(a), code, false, true)),
                }
            }
        };

        let pair_members = target_group.is_none()
            && sources.len() > 1
            && (winner.compound() || !matches!(mirror, Mirror::None));
        if pair_members {
            // Members of a compound source act on each other
            for i in 0..sources.len() {
                for j in i + 1..sources.len() {
                    push_pair(&sources[i], Some(&sources[j]), &mut out.events);
                }
            }
        } else {
            for source in &sources {
                for target in &targets {
                    push_pair(source, target.as_ref(), &mut out.events);
                }
            }
        }
        debug!(%verb, events = out.events.len(), code = %forward, "events emitted");
    }

    /// Codes of a group's members, substituting the placeholder for
    /// unresolved members or dropping them when none is configured.
    fn slot_codes(
        &self,
        group: &ActorGroup,
        annotation: &Annotation,
        slot: ActorSlot,
        verb: &str,
        out: &mut Resolution,
    ) -> Vec<ActorCode> {
        let mut codes = Vec::with_capacity(group.members.len());
        for span in group.members.iter().filter_map(|&m| annotation.spans.get(m)) {
            match &span.code {
                Some(code) => codes.push(code.clone()),
                None => match self.config.placeholder(self.table) {
                    Some(placeholder) => {
                        out.diagnostics.push(Diagnostic::PlaceholderActor {
                            slot,
                            verb: verb.to_string(),
                        });
                        codes.push(placeholder);
                    }
                    None => out.diagnostics.push(Diagnostic::DroppedEvent {
                        verb: verb.to_string(),
                        reason: format!("unresolved {} '{}'", slot_name(slot), span.text),
                    }),
                },
            }
        }
        codes
    }
}

/// The event emitted back from target to source, if any.
enum Mirror {
    None,
    Reciprocal(EventCode),
    Linked(EventCode),
}

/// First group in `order` with a coded member, else the first group at all.
/// Placeholder-only groups are bound only when nothing coded is on that side.
fn nearest(annotation: &Annotation, order: &[usize]) -> Option<usize> {
    order
        .iter()
        .copied()
        .find(|&g| annotation.group_has_code(g))
        .or_else(|| order.first().copied())
}

fn slot_name(slot: ActorSlot) -> &'static str {
    match slot {
        ActorSlot::Source => "source",
        ActorSlot::Target => "target",
    }
}

/// One atom at `at`; returns every place it can end.
fn match_atom(atom: &Atom, at: usize, ctx: &Context<'_>) -> Ends {
    match atom {
        Atom::Verb => (at == ctx.occurrence.start)
            .then_some(ctx.occurrence.end)
            .into_iter()
            .collect(),
        Atom::Word(key) => (ctx.keys.get(at).copied().flatten() == Some(*key))
            .then_some(at + 1)
            .into_iter()
            .collect(),
        Atom::Choice(alternatives) => alternatives
            .iter()
            .filter(|alt| {
                alt.iter()
                    .enumerate()
                    .all(|(i, key)| ctx.keys.get(at + i).copied().flatten() == Some(*key))
            })
            .map(|alt| at + alt.len())
            .collect(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coder::matcher::Matcher;
    use crate::text::tokenize;

    const ACTORS: &str = "\
RUSSIA [RUS]
CHINA [CHN]
ASIAN [ASA]
ISRAEL [ISR]
JORDAN [JOR]
EGYPT [EGY]
";

    const VERBS: &str = "\
ASK
- {WILL|WOULD|IS_TO} * + TO HELP FINANCE [0231]
AGREE [019:019]
SIGN [057]
- % * MILITARY ACCORD [062:062]
MEET {MET} [036]
- * {PEACE|PEACE_TALKS}_TALKS [040]
VISIT [042:043]
SAY [---]
PROTEST [141]
- * AGAINST + [141]
- * {AGAINST|AT} + [145]
";

    fn run(text: &str, config: CoderConfig) -> Resolution {
        let table = CodeTable::builtin();
        let dictionary = Dictionary::builder(&table, &config)
            .actors("actors.txt", ACTORS)
            .unwrap()
            .agents("agents.txt", "BANKS [~BUS]\n")
            .unwrap()
            .verbs("verbs.txt", VERBS)
            .unwrap()
            .build()
            .unwrap();
        let date = NaiveDate::from_ymd_opt(1990, 5, 1).unwrap();
        let tokens = tokenize(text);
        let keys = dictionary.keys(&tokens);
        let norms: Vec<&str> = tokens.iter().map(|t| t.norm.as_str()).collect();
        let verbs = dictionary.verbs.locate(&norms);
        let mut budget = MatchBudget::new(config.match_budget);
        let annotation = Matcher::new(&dictionary, &table, &config).annotate_with(&tokens, &keys, &verbs, date, &mut budget);
        Resolver::new(&dictionary, &table, &config).resolve("S1", date, &tokens, &keys, &verbs, &annotation, &mut budget)
    }

    fn triples(resolution: &Resolution) -> Vec<(String, String, String)> {
        resolution
            .events
            .iter()
            .map(|e| {
                (
                    e.source.to_string(),
                    e.target.as_ref().map(|t| t.to_string()).unwrap_or_default(),
                    e.event_code.to_string(),
                )
            })
            .collect()
    }

    fn t(s: &str, t: &str, c: &str) -> (String, String, String) {
        (s.into(), t.into(), c.into())
    }

    #[test]
    fn test_pattern_with_target_slot_fans_out() {
        let r = run(
            "Russia and China will ask Asian banks to help finance the project",
            CoderConfig::default(),
        );
        assert_eq!(
            triples(&r),
            vec![t("RUS", "ASABUS", "0231"), t("CHN", "ASABUS", "0231")]
        );
        assert!(r.events.iter().all(|e| e.pattern.is_some()));
    }

    #[test]
    fn test_default_code_when_pattern_fails() {
        let r = run("Russia will ask China", CoderConfig::default());
        assert!(r.events.is_empty());
        assert!(r
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::UnresolvedVerb { verb } if verb == "ASK")));
    }

    #[test]
    fn test_compound_pairs_under_percent() {
        let r = run("Israel and Jordan signed a military accord", CoderConfig::default());
        assert_eq!(
            triples(&r),
            vec![t("ISR", "JOR", "062"), t("JOR", "ISR", "062")]
        );
        assert!(!r.events[0].reciprocal);
        assert!(r.events[1].reciprocal);
    }

    #[test]
    fn test_linked_pair() {
        let r = run("Russia visited China", CoderConfig::default());
        assert_eq!(
            triples(&r),
            vec![t("RUS", "CHN", "042"), t("CHN", "RUS", "043")]
        );
        assert!(r.events[1].linked);
        assert!(r.events[0].pattern.is_none(), "headword default");
    }

    #[test]
    fn test_first_verb_wins() {
        let r = run("Russia met China and signed a military accord", CoderConfig::default());
        assert_eq!(triples(&r), vec![t("RUS", "CHN", "036")]);
    }

    #[test]
    fn test_infinitive_verb_loses_to_finite() {
        let r = run("Russia is to meet Egypt after it protested", CoderConfig::default());
        assert_eq!(r.events.len(), 1);
        assert_eq!(r.events[0].event_code.as_str(), "141");
    }

    #[test]
    fn test_suppressed_verb() {
        let r = run("Russia said China", CoderConfig::default());
        assert!(r.events.is_empty());
        assert!(r.diagnostics.iter().any(|d| matches!(d, Diagnostic::Suppressed { .. })));
    }

    #[test]
    fn test_no_verb_and_no_source() {
        let r = run("Russia and China", CoderConfig::default());
        assert_eq!(r.diagnostics, vec![Diagnostic::NoVerb]);

        let r = run("Met China", CoderConfig::default());
        assert!(r.diagnostics.iter().any(|d| matches!(d, Diagnostic::NoSource { .. })));
    }

    #[test]
    fn test_placeholder_and_drop() {
        let r = run("Russia met Freedonian Officials", CoderConfig::default());
        assert_eq!(triples(&r), vec![t("RUS", "UIS", "036")]);
        assert!(r.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::PlaceholderActor {
                slot: ActorSlot::Target,
                ..
            }
        )));

        let config = CoderConfig {
            unidentified_actor: None,
            ..CoderConfig::default()
        };
        let r = run("Russia met Freedonian Officials", config);
        assert!(r.events.is_empty());
        assert!(r.diagnostics.iter().any(|d| matches!(d, Diagnostic::DroppedEvent { .. })));
    }

    #[test]
    fn test_verb_tie_reported() {
        let r = run("Russia protested against China", CoderConfig::default());
        assert_eq!(triples(&r), vec![t("RUS", "CHN", "141")]);
        assert!(r.diagnostics.iter().any(|d| matches!(d, Diagnostic::VerbTie { .. })));
    }

    #[test]
    fn test_shorter_choice_tried_when_longer_fails() {
        let r = run("Russia met China for peace talks", CoderConfig::default());
        assert_eq!(triples(&r), vec![t("RUS", "CHN", "040")]);
        assert!(r.events[0].pattern.is_some(), "pattern beats the headword default");
    }

    #[test]
    fn test_unresolved_group_does_not_displace_coded_source() {
        let config = CoderConfig {
            non_actor_words: Vec::new(),
            ..CoderConfig::default()
        };
        let r = run("Russia on Tuesday met China", config.clone());
        assert_eq!(triples(&r), vec![t("RUS", "CHN", "036")]);
        assert!(!r
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::PlaceholderActor { .. })));

        let r = run("Russia met Tuesday officials and China", config);
        assert_eq!(triples(&r), vec![t("RUS", "CHN", "036")], "coded target after an unresolved one");
    }

    #[test]
    fn test_budget_exhaustion_reported() {
        let config = CoderConfig {
            match_budget: 3,
            ..CoderConfig::default()
        };
        let r = run("Russia and China will ask Asian banks to help finance the project", config);
        assert!(r
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::BudgetExhausted { .. })));
    }
}
