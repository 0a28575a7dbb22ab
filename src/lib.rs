//! CameoCore: Dictionary-Driven CAMEO Event Coder
//!
//! A Rust/WASM coder that turns dated news sentences into
//! `(date, source actor, target actor, event code)` records.
//!
//! # Architecture
//!
//! ## Codes
//! - `codes/event.rs` - EventCode: hierarchical CAMEO event codes (`01`..`204`)
//! - `codes/actor.rs` - ActorCode: composite trigram actor codes (`ISRGOV`)
//! - `codes/table.rs` - CodeTable: code registry, composition rules, audits
//!
//! ## Dictionaries
//! - `dictionary/nouns.rs` - actor and agent patterns over a token trie
//! - `dictionary/verbs.rs` - verbs, surface forms (Aho-Corasick) and event patterns
//! - `dictionary/dates.rs` - date-restricted actor codes
//! - `dictionary/morphology.rs` - verb conjugation
//!
//! ## Coder
//! - `coder/matcher.rs` - actor phrases and compound groups
//! - `coder/resolver.rs` - verb pattern matching, slot binding, event emission
//! - `coder/engine.rs` - Coder: sentence and batch pipeline
//! - `coder/wasm.rs` - CoderCortex: JavaScript facade
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { CoderCortex } from 'cameocore';
//!
//! await init();
//!
//! const cortex = new CoderCortex();
//! cortex.loadDictionaries(actors, agents, verbs);
//!
//! const report = cortex.codeSentence(
//!   "AFP-19980112-0001",
//!   "Russia and China will ask Asian banks to help finance the pipeline",
//!   "19980112"
//! );
//! console.log(report.events);       // RUS -> ASABUS 0231, CHN -> ASABUS 0231
//! console.log(report.diagnostics);  // anything left unresolved
//! ```

pub mod coder;
pub mod codes;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod text;

pub use coder::{BatchReport, CodedEvent, Coder, CoderCortex, Diagnostic, SentenceReport, SentenceStatus};
pub use codes::{ActorCode, CodeTable, EventCode};
pub use config::CoderConfig;
pub use dictionary::{Dictionary, DictionaryBuilder};
pub use error::{CoderError, DictionaryError, Result};
pub use text::Sentence;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("cameocore v{}", env!("CARGO_PKG_VERSION"))
}
