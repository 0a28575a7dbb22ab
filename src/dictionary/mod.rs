//! Dictionaries: actor and agent noun patterns, verbs and their event patterns
//!
//! Built once through [`DictionaryBuilder`] and then frozen: the shared token
//! lexicon becomes a read-only `RodeoReader` and the verb automaton is
//! compiled, so a [`Dictionary`] can be shared across threads behind an `Arc`.
//! Each snapshot carries a content fingerprint that changes whenever any
//! source text changes.

pub mod dates;
pub mod morphology;
pub mod nouns;
pub mod pattern;
pub mod trie;
pub mod verbs;

use lasso::{Rodeo, RodeoReader, Spur};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::info;

use crate::codes::CodeTable;
use crate::config::CoderConfig;
use crate::error::Result;
use crate::text::Token;

pub use dates::{DateRange, DateResolution, DateRestrictions, DatedCode};
pub use nouns::{MatchCandidate, NounDictionary, NounEntry, SubDictionary, Tier};
pub use verbs::{Atom, Element, Emission, VerbDictionary, VerbEntry, VerbOccurrence, VerbPattern};

// =============================================================================
// Shared Types
// =============================================================================

/// Step allowance for pattern matching within one sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchBudget {
    remaining: usize,
    exhausted: bool,
}

impl MatchBudget {
    pub fn new(steps: usize) -> Self {
        Self {
            remaining: steps,
            exhausted: false,
        }
    }

    /// Spend one step; `false` once the budget is gone.
    pub fn step(&mut self) -> bool {
        if self.remaining == 0 {
            self.exhausted = true;
            return false;
        }
        self.remaining -= 1;
        true
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Load-time settings taken from [`CoderConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub year_pivot: u32,
    pub strict_date_overlaps: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            year_pivot: 30,
            strict_date_overlaps: true,
        }
    }
}

impl From<&CoderConfig> for LoadOptions {
    fn from(config: &CoderConfig) -> Self {
        Self {
            year_pivot: config.year_pivot,
            strict_date_overlaps: config.strict_date_overlaps,
        }
    }
}

// =============================================================================
// Dictionary Snapshot
// =============================================================================

/// Immutable, shareable dictionary snapshot.
#[derive(Debug)]
pub struct Dictionary {
    lexicon: RodeoReader,
    pub actors: NounDictionary,
    pub agents: NounDictionary,
    pub verbs: VerbDictionary,
    fingerprint: u64,
}

impl Dictionary {
    pub fn builder<'a>(table: &'a CodeTable, config: &CoderConfig) -> DictionaryBuilder<'a> {
        DictionaryBuilder::new(table, config)
    }

    /// Content hash of every source loaded, in load order.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Lexicon keys for tokens; words no pattern mentions are `None`.
    pub fn keys(&self, tokens: &[Token]) -> Vec<Option<Spur>> {
        tokens.iter().map(|t| self.lexicon.get(&t.norm)).collect()
    }

    /// Every actor and agent pattern hit in the sentence.
    pub fn match_tokens(&self, tokens: &[Token], budget: &mut MatchBudget) -> Vec<MatchCandidate> {
        self.match_keys(&self.keys(tokens), budget)
    }

    /// [`match_tokens`](Self::match_tokens) over keys already looked up.
    pub fn match_keys(&self, keys: &[Option<Spur>], budget: &mut MatchBudget) -> Vec<MatchCandidate> {
        let mut out = self.actors.match_keys(keys, budget);
        out.extend(self.agents.match_keys(keys, budget));
        out
    }

    pub fn noun_entry(&self, tier: Tier, entry: usize) -> Option<&NounEntry> {
        match tier {
            Tier::Actor => self.actors.entry(entry),
            Tier::Agent => self.agents.entry(entry),
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

pub struct DictionaryBuilder<'a> {
    table: &'a CodeTable,
    options: LoadOptions,
    rodeo: Rodeo,
    actors: NounDictionary,
    agents: NounDictionary,
    verbs: VerbDictionary,
    hasher: DefaultHasher,
    order: usize,
}

impl<'a> DictionaryBuilder<'a> {
    pub fn new(table: &'a CodeTable, config: &CoderConfig) -> Self {
        Self {
            table,
            options: LoadOptions::from(config),
            rodeo: Rodeo::default(),
            actors: NounDictionary::new(Tier::Actor),
            agents: NounDictionary::new(Tier::Agent),
            verbs: VerbDictionary::new(),
            hasher: DefaultHasher::new(),
            order: 0,
        }
    }

    fn hash_source(&mut self, kind: &str, name: &str, text: &str) {
        kind.hash(&mut self.hasher);
        name.hash(&mut self.hasher);
        text.hash(&mut self.hasher);
    }

    pub fn actors(mut self, source_name: &str, text: &str) -> Result<Self> {
        self.hash_source("actors", source_name, text);
        self.actors.load(
            source_name,
            text,
            &mut self.rodeo,
            self.table,
            &self.options,
            &mut self.order,
        )?;
        Ok(self)
    }

    pub fn agents(mut self, source_name: &str, text: &str) -> Result<Self> {
        self.hash_source("agents", source_name, text);
        self.agents.load(
            source_name,
            text,
            &mut self.rodeo,
            self.table,
            &self.options,
            &mut self.order,
        )?;
        Ok(self)
    }

    pub fn verbs(mut self, source_name: &str, text: &str) -> Result<Self> {
        self.hash_source("verbs", source_name, text);
        self.verbs
            .load(source_name, text, &mut self.rodeo, self.table, &mut self.order)?;
        Ok(self)
    }

    pub fn build(mut self) -> Result<Dictionary> {
        self.verbs.build()?;
        let fingerprint = self.hasher.finish();
        info!(
            actors = self.actors.len(),
            agents = self.agents.len(),
            verbs = self.verbs.len(),
            verb_patterns = self.verbs.pattern_count(),
            verb_forms = self.verbs.form_count(),
            fingerprint,
            "dictionary snapshot built"
        );
        Ok(Dictionary {
            lexicon: self.rodeo.into_reader(),
            actors: self.actors,
            agents: self.agents,
            verbs: self.verbs,
            fingerprint,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
