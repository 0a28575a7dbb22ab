//! The event coder: actor matching, verb resolution and event emission.

pub mod engine;
pub mod matcher;
pub mod precedence;
pub mod record;
pub mod resolver;
pub mod wasm;

#[cfg(test)]
mod tests;

pub use engine::Coder;
pub use matcher::{ActorGroup, ActorSpan, Annotation, Matcher};
pub use precedence::{SpanRule, VerbRule};
pub use record::{
    events_to_tsv, ActorSlot, BatchReport, BatchStats, CodedEvent, Diagnostic, SentenceReport, SentenceStatus,
    TSV_HEADER,
};
pub use resolver::{Resolution, Resolver};
pub use wasm::{CoderCortex, SentenceInput};
