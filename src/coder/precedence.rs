//! Precedence rules
//!
//! Overlapping noun matches and competing verb patterns are ranked by an
//! ordered list of rules. Each rule compares two candidates; the first rule
//! that prefers one of them decides. `Ordering::Less` means "the left one wins".

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::dictionary::MatchCandidate;

// =============================================================================
// Noun Spans
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanRule {
    /// Actor-tier entries beat agent-tier entries
    ActorTierFirst,
    /// More literal tokens wins
    LongestLiteral,
    /// Wider span wins (wildcards count)
    LongestSpan,
    /// Earlier dictionary line wins
    DictionaryOrder,
}

impl SpanRule {
    pub fn default_order() -> Vec<SpanRule> {
        vec![
            Self::ActorTierFirst,
            Self::LongestLiteral,
            Self::LongestSpan,
            Self::DictionaryOrder,
        ]
    }

    pub fn compare(&self, a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
        match self {
            Self::ActorTierFirst => a.tier.cmp(&b.tier),
            Self::LongestLiteral => b.literal_len.cmp(&a.literal_len),
            Self::LongestSpan => b.span_len().cmp(&a.span_len()),
            Self::DictionaryOrder => a.order.cmp(&b.order),
        }
    }
}

/// Rank two noun matches; position breaks whatever the rules leave equal.
pub fn rank_spans(rules: &[SpanRule], a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    rules
        .iter()
        .map(|rule| rule.compare(a, b))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.start.cmp(&b.start).then(a.entry.cmp(&b.entry)))
}

/// Two matches only dictionary order can separate.
pub fn spans_tied(rules: &[SpanRule], a: &MatchCandidate, b: &MatchCandidate) -> bool {
    rules
        .iter()
        .filter(|r| **r != SpanRule::DictionaryOrder)
        .all(|rule| rule.compare(a, b).is_eq())
}

// =============================================================================
// Verb Patterns
// =============================================================================

/// The facts about a verb candidate the rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbKey {
    pub finite: bool,
    pub verb_start: usize,
    pub specificity: usize,
    pub order: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbRule {
    /// A verb not preceded by an infinitive marker wins
    FiniteFirst,
    /// The first verb in the sentence wins, whatever the pattern length
    EarliestVerb,
    /// More literal words in the pattern wins
    MostSpecific,
    /// Earlier dictionary line wins
    DictionaryOrder,
}

impl VerbRule {
    pub fn default_order() -> Vec<VerbRule> {
        vec![
            Self::FiniteFirst,
            Self::EarliestVerb,
            Self::MostSpecific,
            Self::DictionaryOrder,
        ]
    }

    pub fn compare(&self, a: &VerbKey, b: &VerbKey) -> Ordering {
        match self {
            Self::FiniteFirst => b.finite.cmp(&a.finite),
            Self::EarliestVerb => a.verb_start.cmp(&b.verb_start),
            Self::MostSpecific => b.specificity.cmp(&a.specificity),
            Self::DictionaryOrder => a.order.cmp(&b.order),
        }
    }
}

pub fn rank_verbs(rules: &[VerbRule], a: &VerbKey, b: &VerbKey) -> Ordering {
    rules
        .iter()
        .map(|rule| rule.compare(a, b))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Same verb, same specificity: only dictionary order separates them.
pub fn verbs_tied(rules: &[VerbRule], a: &VerbKey, b: &VerbKey) -> bool {
    a.verb_start == b.verb_start
        && rules
            .iter()
            .filter(|r| **r != VerbRule::DictionaryOrder)
            .all(|rule| rule.compare(a, b).is_eq())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{SubDictionary, Tier};

    fn span(tier: Tier, start: usize, end: usize, literal_len: usize, order: usize) -> MatchCandidate {
        MatchCandidate {
            tier,
            sub: SubDictionary::Generic,
            entry: order,
            start,
            end,
            literal_len,
            order,
        }
    }

    #[test]
    fn test_actor_tier_first() {
        let actor = span(Tier::Actor, 0, 2, 2, 5);
        let agent = span(Tier::Agent, 0, 1, 1, 0);
        assert_eq!(SpanRule::ActorTierFirst.compare(&actor, &agent), Ordering::Less);
        assert_eq!(rank_spans(&SpanRule::default_order(), &agent, &actor), Ordering::Greater);
    }

    #[test]
    fn test_longest_literal_beats_wildcard_span() {
        let literal = span(Tier::Actor, 0, 2, 2, 1);
        let wildcard = span(Tier::Actor, 0, 3, 1, 0);
        assert_eq!(SpanRule::LongestLiteral.compare(&literal, &wildcard), Ordering::Less);
        assert_eq!(SpanRule::LongestSpan.compare(&literal, &wildcard), Ordering::Greater);
        assert_eq!(rank_spans(&SpanRule::default_order(), &literal, &wildcard), Ordering::Less);
    }

    #[test]
    fn test_dictionary_order_tie() {
        let first = span(Tier::Actor, 0, 1, 1, 3);
        let second = span(Tier::Actor, 0, 1, 1, 9);
        let rules = SpanRule::default_order();
        assert!(spans_tied(&rules, &first, &second));
        assert_eq!(rank_spans(&rules, &first, &second), Ordering::Less);
        assert!(!spans_tied(&rules, &first, &span(Tier::Agent, 0, 1, 1, 0)));
    }

    #[test]
    fn test_rule_order_is_configurable() {
        let literal = span(Tier::Actor, 0, 2, 2, 1);
        let wildcard = span(Tier::Actor, 0, 3, 1, 0);
        let rules = vec![SpanRule::LongestSpan, SpanRule::LongestLiteral];
        assert_eq!(rank_spans(&rules, &literal, &wildcard), Ordering::Greater);
    }

    fn verb(finite: bool, verb_start: usize, specificity: usize, order: usize) -> VerbKey {
        VerbKey { finite, verb_start, specificity, order }
    }

    #[test]
    fn test_first_verb_wins_over_length() {
        let rules = VerbRule::default_order();
        let early_short = verb(true, 2, 1, 7);
        let late_long = verb(true, 5, 6, 1);
        assert_eq!(rank_verbs(&rules, &early_short, &late_long), Ordering::Less);
    }

    #[test]
    fn test_finite_before_infinitive() {
        let rules = VerbRule::default_order();
        let infinitive = verb(false, 1, 3, 0);
        let finite = verb(true, 4, 1, 5);
        assert_eq!(rank_verbs(&rules, &finite, &infinitive), Ordering::Less);
    }

    #[test]
    fn test_specific_pattern_on_same_verb() {
        let rules = VerbRule::default_order();
        let residual = verb(true, 2, 1, 0);
        let specific = verb(true, 2, 4, 3);
        assert_eq!(rank_verbs(&rules, &specific, &residual), Ordering::Less);
        assert!(verbs_tied(&rules, &verb(true, 2, 3, 0), &verb(true, 2, 3, 8)));
        assert!(!verbs_tied(&rules, &residual, &specific));
    }
}
