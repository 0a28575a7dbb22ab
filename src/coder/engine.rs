//! Coder: the sentence pipeline
//!
//! tokenize → split clauses → locate verbs → annotate actors → resolve events
//!
//! A [`Coder`] holds shared, read-only snapshots of the code table and the
//! dictionaries, so one instance can code many sentences at once.

use std::sync::Arc;

use tracing::{debug, info};

use super::matcher::Matcher;
use super::record::{BatchReport, BatchStats, CodedEvent, SentenceReport, SentenceStatus};
use super::resolver::{Resolution, Resolver};
use crate::codes::{AuditFinding, CodeTable};
use crate::config::CoderConfig;
use crate::dictionary::{Dictionary, MatchBudget};
use crate::error::Result;
use crate::text::{tokenize, Sentence, Token};

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use rayon::prelude::*;

pub struct Coder {
    table: Arc<CodeTable>,
    dictionary: Arc<Dictionary>,
    config: CoderConfig,
}

impl Coder {
    pub fn new(table: Arc<CodeTable>, dictionary: Arc<Dictionary>, mut config: CoderConfig) -> Result<Self> {
        config.normalize();
        config.validate(&table)?;
        info!(
            fingerprint = dictionary.fingerprint(),
            codes = table.len(),
            "coder ready"
        );
        Ok(Self {
            table,
            dictionary,
            config,
        })
    }

    /// A coder over the same snapshots with different settings.
    pub fn reconfigure(&self, config: CoderConfig) -> Result<Self> {
        Self::new(Arc::clone(&self.table), Arc::clone(&self.dictionary), config)
    }

    pub fn table(&self) -> &CodeTable {
        &self.table
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn config(&self) -> &CoderConfig {
        &self.config
    }

    // =========================================================================
    // Coding
    // =========================================================================

    pub fn code_sentence(&self, sentence: &Sentence) -> SentenceReport {
        let start = instant::Instant::now();
        let tokens = tokenize(&sentence.text);
        let matcher = Matcher::new(&self.dictionary, &self.table, &self.config);
        let resolver = Resolver::new(&self.dictionary, &self.table, &self.config);
        let mut budget = MatchBudget::new(self.config.match_budget);

        let mut out = Resolution::default();
        for clause in self.clauses(&tokens) {
            self.code_clause(clause, sentence, &matcher, &resolver, &mut budget, &mut out);
        }
        let Resolution { events, diagnostics } = out;

        let status = SentenceStatus::classify(&events, &diagnostics);
        let time_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            sentence = %sentence.id,
            events = events.len(),
            diagnostics = diagnostics.len(),
            ?status,
            "sentence coded"
        );
        SentenceReport {
            sentence_id: sentence.id.clone(),
            date: sentence.date,
            status,
            events,
            diagnostics,
            time_ms,
        }
    }

    /// Code sentences independently; reports keep input order.
    pub fn code_batch(&self, sentences: &[Sentence]) -> BatchReport {
        let start = instant::Instant::now();

        #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
        let reports: Vec<SentenceReport> = sentences.par_iter().map(|s| self.code_sentence(s)).collect();
        #[cfg(not(all(feature = "parallel", not(target_arch = "wasm32"))))]
        let reports: Vec<SentenceReport> = sentences.iter().map(|s| self.code_sentence(s)).collect();

        let mut stats = BatchStats {
            dictionary_fingerprint: self.dictionary.fingerprint(),
            ..BatchStats::default()
        };
        for report in &reports {
            stats.record(report);
        }
        stats.total_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            sentences = stats.sentences,
            events = stats.events,
            unresolved = stats.unresolved,
            total_ms = stats.total_time_ms,
            "batch coded"
        );
        BatchReport { reports, stats }
    }

    /// Check previously coded events against the current code table.
    pub fn audit(&self, events: &[CodedEvent]) -> Vec<AuditFinding> {
        self.table.audit(events)
    }

    /// Code one clause, or its two halves when the annotation finds a
    /// conjunction that opens a new clause.
    fn code_clause(
        &self,
        clause: &[Token],
        sentence: &Sentence,
        matcher: &Matcher<'_>,
        resolver: &Resolver<'_>,
        budget: &mut MatchBudget,
        out: &mut Resolution,
    ) {
        let keys = self.dictionary.keys(clause);
        let norms: Vec<&str> = clause.iter().map(|t| t.norm.as_str()).collect();
        let verbs = self.dictionary.verbs.locate(&norms);

        let annotation = matcher.annotate_with(clause, &keys, &verbs, sentence.date, budget);
        if let Some(&(end, resume)) = annotation.clause_splits.first() {
            debug!(sentence = %sentence.id, end, resume, "conjunction opens a new clause");
            self.code_clause(&clause[..end], sentence, matcher, resolver, budget, out);
            self.code_clause(&clause[resume..], sentence, matcher, resolver, budget, out);
            return;
        }

        let resolution = resolver.resolve(
            &sentence.id,
            sentence.date,
            clause,
            &keys,
            &verbs,
            &annotation,
            budget,
        );
        out.diagnostics.extend(annotation.diagnostics);
        out.diagnostics.extend(resolution.diagnostics);
        out.events.extend(resolution.events);
    }

    /// Token runs between clause breaks; the break tokens themselves are dropped.
    fn clauses<'t>(&self, tokens: &'t [Token]) -> Vec<&'t [Token]> {
        tokens
            .split(|t| self.config.is_clause_break(&t.norm))
            .filter(|clause| !clause.is_empty())
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
