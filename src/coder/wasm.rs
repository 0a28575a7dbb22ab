//! CoderCortex: the JavaScript-facing coder
//!
//! ```javascript,ignore
//! const cortex = new CoderCortex();
//! cortex.loadDictionaries(actorsText, agentsText, verbsText);
//! const report = cortex.codeSentence("AFP-1", "Russia and China will ask ...", "19980112");
//! const tsv = cortex.codeBatchTsv([{ id: "AFP-1", text: "...", date: "1998-01-12" }]);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use wasm_bindgen::prelude::*;

use super::engine::Coder;
use super::record::{BatchReport, SentenceReport};
use crate::codes::CodeTable;
use crate::config::CoderConfig;
use crate::dictionary::Dictionary;
use crate::error::{CoderError, Result};
use crate::text::{parse_date, Sentence};

/// A sentence as JavaScript passes it in; dates may be `YYYYMMDD` or `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceInput {
    pub id: String,
    pub text: String,
    pub date: String,
}

impl SentenceInput {
    pub fn into_sentence(self) -> Result<Sentence> {
        let date = parse_date(&self.date)?;
        Ok(Sentence::new(self.id, self.text, date))
    }
}

#[wasm_bindgen]
pub struct CoderCortex {
    table: Arc<CodeTable>,
    config: CoderConfig,
    coder: Option<Coder>,
}

impl Default for CoderCortex {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Native API
// =============================================================================

impl CoderCortex {
    pub fn new() -> Self {
        Self {
            table: Arc::new(CodeTable::builtin()),
            config: CoderConfig::default(),
            coder: None,
        }
    }

    /// Replace the code table. Dictionaries must be reloaded afterwards.
    pub fn load_code_table(&mut self, text: &str) -> Result<usize> {
        let table = CodeTable::parse(text)?;
        self.config.validate(&table)?;
        let count = table.len();
        self.table = Arc::new(table);
        self.coder = None;
        Ok(count)
    }

    /// Replace the configuration, keeping loaded dictionaries.
    pub fn set_config(&mut self, json: &str) -> Result<()> {
        let config = CoderConfig::from_json(json)?;
        config.validate(&self.table)?;
        if let Some(coder) = &self.coder {
            let next = coder.reconfigure(config.clone())?;
            self.coder = Some(next);
        }
        self.config = config;
        Ok(())
    }

    /// Build a fresh dictionary snapshot and swap it in.
    pub fn load_dictionaries(&mut self, actors: &str, agents: &str, verbs: &str) -> Result<u64> {
        let dictionary = Dictionary::builder(&self.table, &self.config)
            .actors("actors", actors)?
            .agents("agents", agents)?
            .verbs("verbs", verbs)?
            .build()?;
        let fingerprint = dictionary.fingerprint();
        self.coder = Some(Coder::new(
            Arc::clone(&self.table),
            Arc::new(dictionary),
            self.config.clone(),
        )?);
        info!(fingerprint, "dictionaries loaded");
        Ok(fingerprint)
    }

    pub fn is_ready(&self) -> bool {
        self.coder.is_some()
    }

    fn coder(&self) -> Result<&Coder> {
        self.coder
            .as_ref()
            .ok_or_else(|| CoderError::config("dictionaries not loaded"))
    }

    pub fn code_sentence(&self, input: SentenceInput) -> Result<SentenceReport> {
        let coder = self.coder()?;
        Ok(coder.code_sentence(&input.into_sentence()?))
    }

    pub fn code_batch(&self, inputs: Vec<SentenceInput>) -> Result<BatchReport> {
        let coder = self.coder()?;
        let sentences = inputs
            .into_iter()
            .map(SentenceInput::into_sentence)
            .collect::<Result<Vec<_>>>()?;
        Ok(coder.code_batch(&sentences))
    }
}

fn js_error(e: CoderError) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

// =============================================================================
// WASM API
// =============================================================================

#[wasm_bindgen]
impl CoderCortex {
    #[wasm_bindgen(constructor)]
    pub fn js_new() -> Self {
        Self::new()
    }

    #[wasm_bindgen(js_name = loadCodeTable)]
    pub fn js_load_code_table(&mut self, text: &str) -> std::result::Result<usize, JsValue> {
        self.load_code_table(text).map_err(js_error)
    }

    #[wasm_bindgen(js_name = setConfig)]
    pub fn js_set_config(&mut self, json: &str) -> std::result::Result<(), JsValue> {
        self.set_config(json).map_err(js_error)
    }

    /// Returns the snapshot fingerprint as a decimal string.
    #[wasm_bindgen(js_name = loadDictionaries)]
    pub fn js_load_dictionaries(&mut self, actors: &str, agents: &str, verbs: &str) -> std::result::Result<String, JsValue> {
        self.load_dictionaries(actors, agents, verbs)
            .map(|f| f.to_string())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = isReady)]
    pub fn js_is_ready(&self) -> bool {
        self.is_ready()
    }

    #[wasm_bindgen(js_name = codeSentence)]
    pub fn js_code_sentence(&self, id: &str, text: &str, date: &str) -> std::result::Result<JsValue, JsValue> {
        let input = SentenceInput {
            id: id.to_string(),
            text: text.to_string(),
            date: date.to_string(),
        };
        let report = self.code_sentence(input).map_err(js_error)?;
        Ok(to_js(&report))
    }

    #[wasm_bindgen(js_name = codeBatch)]
    pub fn js_code_batch(&self, sentences: JsValue) -> std::result::Result<JsValue, JsValue> {
        let inputs: Vec<SentenceInput> = serde_wasm_bindgen::from_value(sentences)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse sentences: {}", e)))?;
        let batch = self.code_batch(inputs).map_err(js_error)?;
        Ok(to_js(&batch))
    }

    #[wasm_bindgen(js_name = codeBatchTsv)]
    pub fn js_code_batch_tsv(&self, sentences: JsValue) -> std::result::Result<String, JsValue> {
        let inputs: Vec<SentenceInput> = serde_wasm_bindgen::from_value(sentences)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse sentences: {}", e)))?;
        Ok(self.code_batch(inputs).map_err(js_error)?.to_tsv())
    }
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    match serde_wasm_bindgen::to_value(value) {
        Ok(v) => v,
        Err(e) => {
            web_sys::console::error_1(&format!("[CoderCortex] Serialization failed: {:?}", e).into());
            JsValue::NULL
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> CoderCortex {
        let mut cortex = CoderCortex::new();
        cortex
            .load_dictionaries("RUSSIA [RUS]\nCHINA [CHN]\n", "", "MEET {MET} [036]\n")
            .unwrap();
        cortex
    }

    fn input(text: &str, date: &str) -> SentenceInput {
        SentenceInput {
            id: "S1".into(),
            text: text.into(),
            date: date.into(),
        }
    }

    #[test]
    fn test_not_ready_until_loaded() {
        let cortex = CoderCortex::new();
        assert!(!cortex.is_ready());
        assert!(cortex.code_sentence(input("Russia met China", "20010101")).is_err());
        assert!(ready().is_ready());
    }

    #[test]
    fn test_code_sentence_and_dates() {
        let cortex = ready();
        let report = cortex.code_sentence(input("Russia met China", "2001-01-01")).unwrap();
        assert_eq!(report.events.len(), 1);
        assert!(cortex.code_sentence(input("Russia met China", "01/01/2001")).is_err());
    }

    #[test]
    fn test_config_swap_keeps_dictionaries() {
        let mut cortex = ready();
        cortex.set_config(r#"{"max_gap": 2}"#).unwrap();
        assert!(cortex.is_ready());
        assert_eq!(cortex.coder().unwrap().config().max_gap, 2);
        assert!(cortex.set_config(r#"{"match_budget": 0}"#).is_err());
    }

    #[test]
    fn test_code_table_swap_requires_reload() {
        let mut cortex = ready();
        let count = cortex.load_code_table(include_str!("../../data/cameo.codes")).unwrap();
        assert!(count > 200);
        assert!(!cortex.is_ready());
    }
}
