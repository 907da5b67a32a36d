use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::patterns::normalize_lang;
use crate::style::ClassifiedRun;
use crate::textutil::char_slice;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no translation for {text:?} ({lang})")]
    Unavailable { lang: String, text: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleHint {
    pub text: String,
    /// `#rrggbb`, or "none" without a solid fill.
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleMapping {
    pub original_text: String,
    pub translated_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub target_lang: String,
    #[serde(default)]
    pub force_retranslate: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub style_hints: Vec<StyleHint>,
}

impl TranslateRequest {
    pub fn new(text: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_lang: target_lang.into(),
            force_retranslate: false,
            style_hints: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translated_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub style_mapping: Vec<StyleMapping>,
}

impl TranslateResponse {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            translated_text: text.into(),
            style_mapping: Vec::new(),
        }
    }
}

pub trait TranslationService {
    fn translate(&self, req: &TranslateRequest) -> Result<TranslateResponse, ServiceError>;
}

/// Visible placeholder used when the service fails, so untranslated text is easy to spot.
pub fn fallback_translation(text: &str, lang: &str) -> String {
    format!("[{lang}] {text}")
}

/// One hint per special run with visible text.
pub fn style_hints(original: &str, classified: &[ClassifiedRun]) -> Vec<StyleHint> {
    classified
        .iter()
        .filter(|c| c.is_special())
        .filter_map(|c| {
            let text = char_slice(original, c.run.start, c.run.end).trim();
            (!text.is_empty()).then(|| StyleHint {
                text: text.to_string(),
                color: c.run.style.describe_fill(),
            })
        })
        .collect()
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum GlossaryValue {
    Plain(String),
    Full(TranslateResponse),
}

impl From<GlossaryValue> for TranslateResponse {
    fn from(value: GlossaryValue) -> Self {
        match value {
            GlossaryValue::Plain(text) => TranslateResponse::plain(text),
            GlossaryValue::Full(resp) => resp,
        }
    }
}

/// Offline translations keyed by language, then by exact source text.
#[derive(Clone, Debug, Default)]
pub struct GlossaryService {
    entries: HashMap<String, HashMap<String, TranslateResponse>>,
}

impl GlossaryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_path(path: &Path) -> anyhow::Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read glossary: {}", path.display()))?;
        Self::from_json_slice(&bytes)
            .with_context(|| format!("parse glossary json: {}", path.display()))
    }

    pub fn from_json_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        let raw: HashMap<String, HashMap<String, GlossaryValue>> = serde_json::from_slice(bytes)?;
        let mut service = Self::new();
        for (lang, table) in raw {
            for (source, value) in table {
                service.insert(&lang, &source, value.into());
            }
        }
        Ok(service)
    }

    pub fn insert(&mut self, lang: &str, source: &str, response: TranslateResponse) {
        self.entries
            .entry(normalize_lang(lang))
            .or_default()
            .insert(source.trim().to_string(), response);
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TranslationService for GlossaryService {
    fn translate(&self, req: &TranslateRequest) -> Result<TranslateResponse, ServiceError> {
        let lang = normalize_lang(&req.target_lang);
        self.entries
            .get(&lang)
            .and_then(|table| table.get(req.text.trim()))
            .cloned()
            .ok_or_else(|| ServiceError::Unavailable {
                lang,
                text: req.text.clone(),
            })
    }
}
