//! Coder configuration
//!
//! Every field has a default, so `{}` is a valid configuration and partial JSON
//! objects only override what they name.

use serde::{Deserialize, Serialize};

use crate::codes::{ActorCode, CodeTable};
use crate::coder::precedence::{SpanRule, VerbRule};
use crate::error::{CoderError, Result};

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoderConfig {
    /// Maximum tokens skipped between two space-separated pattern units. Default: 6
    pub max_gap: usize,
    /// Backtracking steps allowed per sentence before matching gives up. Default: 10000
    pub match_budget: usize,
    /// Tie-break order for overlapping noun matches
    pub span_rules: Vec<SpanRule>,
    /// Tie-break order for competing verb patterns
    pub verb_rules: Vec<VerbRule>,
    /// Use the most recent earlier role when a date falls between two
    /// restricted intervals. Default: true
    pub assume_role_persists: bool,
    /// Reject overlapping date restrictions at load instead of dropping the
    /// later one. Default: true
    pub strict_date_overlaps: bool,
    /// Placeholder for actor slots that cannot be resolved. `None` drops the
    /// event instead. Default: "UIS"
    pub unidentified_actor: Option<String>,
    /// Tokens that join actor phrases into a compound
    pub conjunctions: Vec<String>,
    /// Tokens allowed inside one actor phrase between matches
    pub phrase_glue: Vec<String>,
    /// Tokens that mark the next verb as non-finite
    pub infinitive_markers: Vec<String>,
    /// Tokens that split a sentence into independently coded clauses
    pub clause_breaks: Vec<String>,
    /// Capitalised words that never start an unresolved actor: prepositions,
    /// weekdays and months
    pub non_actor_words: Vec<String>,
    /// Two-digit years below this are 20xx, the rest 19xx. Default: 30
    pub year_pivot: u32,
    /// Report capitalised uncovered words as unresolved actors. Default: true
    pub report_unresolved_actors: bool,
}

impl Default for CoderConfig {
    fn default() -> Self {
        Self {
            max_gap: 6,
            match_budget: 10_000,
            span_rules: SpanRule::default_order(),
            verb_rules: VerbRule::default_order(),
            assume_role_persists: true,
            strict_date_overlaps: true,
            unidentified_actor: Some("UIS".to_string()),
            conjunctions: words(&["AND", "&", ","]),
            phrase_glue: words(&["THE", "OF", "'S", "A", "AN"]),
            infinitive_markers: words(&["TO"]),
            clause_breaks: words(&[";"]),
            non_actor_words: words(&[
                "IN", "ON", "AT", "AFTER", "BEFORE", "DURING", "SINCE", "UNTIL", "FROM", "WITH", "BY", "FOR",
                "OVER", "UNDER", "AMID", "MEANWHILE", "MONDAY", "TUESDAY", "WEDNESDAY", "THURSDAY", "FRIDAY",
                "SATURDAY", "SUNDAY", "JANUARY", "FEBRUARY", "MARCH", "APRIL", "MAY", "JUNE", "JULY", "AUGUST",
                "SEPTEMBER", "OCTOBER", "NOVEMBER", "DECEMBER",
            ]),
            year_pivot: 30,
            report_unresolved_actors: true,
        }
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl CoderConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.normalize();
        Ok(config)
    }

    /// Uppercase the token lists so they compare against normalized tokens.
    pub fn normalize(&mut self) {
        for list in [
            &mut self.conjunctions,
            &mut self.phrase_glue,
            &mut self.infinitive_markers,
            &mut self.clause_breaks,
            &mut self.non_actor_words,
        ] {
            for word in list.iter_mut() {
                *word = word.to_uppercase();
            }
        }
    }

    /// Check settings that depend on the code table.
    pub fn validate(&self, table: &CodeTable) -> Result<()> {
        if self.match_budget == 0 {
            return Err(CoderError::config("match_budget must be positive"));
        }
        if self.span_rules.is_empty() || self.verb_rules.is_empty() {
            return Err(CoderError::config("precedence rule lists cannot be empty"));
        }
        if self.year_pivot > 99 {
            return Err(CoderError::config("year_pivot must be between 0 and 99"));
        }
        if let Some(placeholder) = &self.unidentified_actor {
            let code = ActorCode::parse(placeholder)?;
            table
                .validate_actor(&code)
                .map_err(|e| CoderError::config(format!("unidentified_actor: {}", e)))?;
        }
        Ok(())
    }

    /// The placeholder actor, if configured and defined by the table.
    pub fn placeholder(&self, table: &CodeTable) -> Option<ActorCode> {
        let code = ActorCode::parse(self.unidentified_actor.as_deref()?).ok()?;
        table.validate_actor(&code).ok().map(|_| code)
    }

    pub fn is_conjunction(&self, norm: &str) -> bool {
        self.conjunctions.iter().any(|w| w == norm)
    }

    pub fn is_glue(&self, norm: &str) -> bool {
        self.phrase_glue.iter().any(|w| w == norm)
    }

    pub fn is_infinitive_marker(&self, norm: &str) -> bool {
        self.infinitive_markers.iter().any(|w| w == norm)
    }

    pub fn is_clause_break(&self, norm: &str) -> bool {
        self.clause_breaks.iter().any(|w| w == norm)
    }

    pub fn is_non_actor(&self, norm: &str) -> bool {
        self.non_actor_words.iter().any(|w| w == norm)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoderConfig::default();
        assert_eq!(config.max_gap, 6);
        assert_eq!(config.unidentified_actor.as_deref(), Some("UIS"));
        assert!(config.is_conjunction("AND"));
        assert!(config.is_glue("'S"));
        assert!(config.is_non_actor("TUESDAY"));
        assert!(config.is_non_actor("IN"));
        assert!(config.validate(&CodeTable::builtin()).is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CoderConfig::from_json(r#"{"max_gap": 2, "conjunctions": ["and", "plus"]}"#)
            .unwrap();
        assert_eq!(config.max_gap, 2);
        assert_eq!(config.match_budget, 10_000);
        assert!(config.is_conjunction("PLUS"), "lists are uppercased");
        assert_eq!(config.span_rules, SpanRule::default_order());
    }

    #[test]
    fn test_rule_names_in_json() {
        let config =
            CoderConfig::from_json(r#"{"verb_rules": ["most_specific", "earliest_verb"]}"#).unwrap();
        assert_eq!(
            config.verb_rules,
            vec![VerbRule::MostSpecific, VerbRule::EarliestVerb]
        );
    }

    #[test]
    fn test_validate_placeholder() {
        let table = CodeTable::builtin();
        let mut config = CoderConfig::default();
        config.unidentified_actor = Some("XYZ".into());
        assert!(config.validate(&table).is_err());
        assert!(config.placeholder(&table).is_none());

        config.unidentified_actor = None;
        assert!(config.validate(&table).is_ok());
        assert!(config.placeholder(&table).is_none());
    }

    #[test]
    fn test_placeholder_requires_table_entry() {
        let table = CodeTable::parse("EVENT | 01 | Statement\nCOUNTRY | USA | US").unwrap();
        let config = CoderConfig::default();
        assert!(config.placeholder(&table).is_none(), "UIS not defined");
    }
}
