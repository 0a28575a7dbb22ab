use super::fixtures::{coder, coder_with, sentence, t, triples, VERBS};
use crate::coder::{CodedEvent, Diagnostic, SentenceStatus};
use crate::config::CoderConfig;

// ============================================================================
// Compound Actors
// ============================================================================

#[test]
fn test_compound_source_fans_out_over_target() {
    let coder = coder();
    let s = sentence(
        "Russia and China will ask Asian banks to help finance the pipeline",
        1998,
        1,
        12,
    );
    let report = coder.code_sentence(&s);
    assert_eq!(report.status, SentenceStatus::Resolved, "{:?}", report.diagnostics);
    assert_eq!(
        triples(&coder, &s),
        vec![t("RUS", "ASABUS", "0231"), t("CHN", "ASABUS", "0231")]
    );
    assert!(report
        .events
        .iter()
        .all(|e| e.pattern.as_deref().is_some_and(|p| p.ends_with("TO HELP FINANCE"))));
}

#[test]
fn test_reciprocal_between_compound_members() {
    let coder = coder();
    let s = sentence(
        "President Reagan and Egyptian President Hosni Mubarak agreed today",
        1985,
        6,
        12,
    );
    let report = coder.code_sentence(&s);
    assert_eq!(
        triples(&coder, &s),
        vec![t("USAGOV", "EGYGOV", "019"), t("EGYGOV", "USAGOV", "019")]
    );
    assert!(!report.events[0].reciprocal);
    assert!(report.events[1].reciprocal);
}

#[test]
fn test_percent_pattern_pairs_members() {
    let coder = coder();
    let accord = sentence("Israel and Jordan signed a military accord", 1994, 10, 26);
    assert_eq!(
        triples(&coder, &accord),
        vec![t("ISR", "JOR", "062"), t("JOR", "ISR", "062")]
    );

    // Without the pattern the symmetric default still pairs them
    let plain = sentence("Israel and Jordan signed a treaty", 1994, 10, 26);
    assert_eq!(
        triples(&coder, &plain),
        vec![t("ISR", "JOR", "057"), t("JOR", "ISR", "057")]
    );
}

// ============================================================================
// Dates
// ============================================================================

#[test]
fn test_labor_party_by_date() {
    let coder = coder();
    let text = "The Labor Party criticized Syria";
    assert_eq!(
        triples(&coder, &sentence(text, 1994, 1, 1)),
        vec![t("ISRGOV", "SYR", "111")]
    );
    assert_eq!(
        triples(&coder, &sentence(text, 1997, 6, 1)),
        vec![t("ISROPP", "SYR", "111")]
    );

    let report = coder.code_sentence(&sentence(text, 2005, 1, 1));
    assert_eq!(report.events[0].source.to_string(), "ISR");
    assert_eq!(report.status, SentenceStatus::PartiallyResolved);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::NoDateCoverage { entry, .. } if entry == "ISRAELI LABOR PARTY")));
}

#[test]
fn test_default_code_outside_restriction() {
    let coder = coder();
    let s = sentence("Reagan criticized Syria", 1993, 2, 1);
    assert_eq!(triples(&coder, &s), vec![t("USAELI", "SYR", "111")]);
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_actor_entry_beats_overlapping_agent() {
    let coder = coder();
    let s = sentence("Admiral Nelson attacked France", 1805, 10, 21);
    assert_eq!(triples(&coder, &s), vec![t("GBRMIL", "FRA", "190")]);
}

#[test]
fn test_first_verb_decides() {
    let coder = coder();
    let s = sentence("Russia attacked China and met France", 2001, 1, 1);
    assert_eq!(triples(&coder, &s), vec![t("RUS", "CHN", "190")]);
}

#[test]
fn test_wildcard_agent() {
    let coder = coder();
    let s = sentence("The Israeli defense minister met Jordan", 1994, 1, 1);
    assert_eq!(triples(&coder, &s), vec![t("ISRGOV", "JOR", "036")]);
}

// ============================================================================
// Unresolved Input
// ============================================================================

#[test]
fn test_weekday_between_source_and_verb() {
    let coder = coder();
    let s = sentence("Russia on Tuesday criticized China", 2001, 1, 1);
    assert_eq!(triples(&coder, &s), vec![t("RUS", "CHN", "111")]);
}

#[test]
fn test_coded_source_preferred_over_unresolved_name() {
    let coder = coder();
    let s = sentence("Russia near Freedonia criticized China", 2001, 1, 1);
    assert_eq!(triples(&coder, &s), vec![t("RUS", "CHN", "111")]);

    let s = sentence("Russia and China near Freedonia agreed", 2001, 1, 1);
    assert_eq!(
        triples(&coder, &s),
        vec![t("RUS", "CHN", "019"), t("CHN", "RUS", "019")]
    );
}

#[test]
fn test_leading_prepositional_phrase_is_not_an_actor() {
    let coder = coder();
    let s = sentence("In Paris, Russia met China", 2001, 1, 1);
    assert_eq!(triples(&coder, &s), vec![t("RUS", "CHN", "036")]);
}

#[test]
fn test_conjunction_before_new_subject() {
    let coder = coder();
    let s = sentence("Russia met China and Syria criticized France", 2001, 1, 1);
    assert_eq!(
        triples(&coder, &s),
        vec![t("RUS", "CHN", "036"), t("SYR", "FRA", "111")]
    );
}

#[test]
fn test_reciprocal_with_explicit_target() {
    let coder = coder();
    let report = coder.code_sentence(&sentence("Russia negotiated with China", 2001, 1, 1));
    let pairs: Vec<(String, String, bool)> = report
        .events
        .iter()
        .map(|e| (e.source.to_string(), e.target.as_ref().map(|t| t.to_string()).unwrap_or_default(), e.reciprocal))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("RUS".to_string(), "CHN".to_string(), false),
            ("CHN".to_string(), "RUS".to_string(), true),
        ]
    );
    assert!(report.events.iter().all(|e| e.event_code.as_str() == "046"));
}

#[test]
fn test_unknown_target_gets_placeholder() {
    let coder = coder();
    let s = sentence("Russia met Freedonian Officials", 2001, 1, 1);
    let report = coder.code_sentence(&s);
    assert_eq!(triples(&coder, &s), vec![t("RUS", "UIS", "036")]);
    assert_eq!(report.status, SentenceStatus::PartiallyResolved);
}

#[test]
fn test_placeholder_disabled_drops_event() {
    let coder = coder_with(CoderConfig {
        unidentified_actor: None,
        ..CoderConfig::default()
    });
    let report = coder.code_sentence(&sentence("Russia met Freedonian Officials", 2001, 1, 1));
    assert!(report.events.is_empty());
    assert_eq!(report.status, SentenceStatus::Unresolved);
}

#[test]
fn test_suppressed_verb_is_resolved() {
    let coder = coder();
    let report = coder.code_sentence(&sentence("Russia said China", 2001, 1, 1));
    assert!(report.events.is_empty());
    assert_eq!(report.status, SentenceStatus::Resolved);
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_batch_tsv_and_audit() {
    let coder = coder();
    let batch = coder.code_batch(&[
        sentence("Russia met China", 2001, 1, 1),
        sentence("Israel and Jordan signed a military accord", 1994, 10, 26),
    ]);
    let tsv = batch.to_tsv();
    println!("{}", tsv);
    let events = CodedEvent::from_tsv(&tsv).unwrap();
    assert_eq!(events.len(), 3);
    assert!(coder.audit(&events).is_empty());

    let mut stale = events[0].clone();
    stale.source = crate::codes::ActorCode::parse("XYZ").unwrap();
    let findings = coder.audit(&[stale]);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].field, "source");
}

#[test]
fn test_fingerprint_is_stable_across_loads() {
    let a = coder();
    let b = coder();
    assert_eq!(a.dictionary().fingerprint(), b.dictionary().fingerprint());
    assert_eq!(a.dictionary().verbs.len(), VERBS.lines().filter(|l| !l.starts_with('-')).count());
}
