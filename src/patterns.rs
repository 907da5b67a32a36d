use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::style::FontRef;
use crate::textutil::contains_rtl_script;

const RTL_LANGUAGES: [&str; 4] = ["ar", "he", "fa", "ur"];
const SHARED_FALLBACK_FONTS: [&str; 2] = ["Arial", "Segoe UI"];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePatternEntry {
    #[serde(default)]
    pub exact_phrases: Vec<String>,
    #[serde(default)]
    pub fallback_token: Option<String>,
    #[serde(default)]
    pub rtl: bool,
    #[serde(default)]
    pub original_trigger_phrases: Vec<String>,
    /// Script-capable fonts tried, in order, when a node's font cannot be loaded.
    #[serde(default)]
    pub fallback_fonts: Vec<FontRef>,
}

static EMPTY_ENTRY: Lazy<LanguagePatternEntry> = Lazy::new(LanguagePatternEntry::default);

fn regular_fonts(families: &[&str]) -> Vec<FontRef> {
    families.iter().map(|f| FontRef::new(*f, "Regular")).collect()
}

fn script_fonts(fallback_fonts: Vec<FontRef>) -> LanguagePatternEntry {
    LanguagePatternEntry {
        fallback_fonts,
        ..LanguagePatternEntry::default()
    }
}

static BUILTIN: Lazy<LanguagePatternTable> = Lazy::new(|| {
    let reading_lists = || vec!["reading list".to_string(), "reading lists".to_string()];
    let mut entries = HashMap::new();
    entries.insert(
        "hi".to_string(),
        LanguagePatternEntry {
            exact_phrases: [
                "पढ़ने की सूची",
                "पढ़ने की सूचियां",
                "पढ़ने वाली सूची",
                "रीडिंग लिस्ट",
                "पढ़ने की सूचियों",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            fallback_token: Some("पढ़ने".to_string()),
            rtl: false,
            original_trigger_phrases: reading_lists(),
            fallback_fonts: regular_fonts(&[
                "Noto Sans Devanagari",
                "Kohinoor Devanagari",
                "Mangal",
                "Aparajita",
            ]),
        },
    );
    entries.insert(
        "ar".to_string(),
        LanguagePatternEntry {
            exact_phrases: vec!["قوائم القراءة".to_string(), "قائمة القراءة".to_string()],
            fallback_token: None,
            rtl: true,
            original_trigger_phrases: reading_lists(),
            fallback_fonts: regular_fonts(&[
                "Noto Naskh Arabic",
                "Noto Kufi Arabic",
                "Dubai",
                "Almarai",
                "Cairo",
                "IBM Plex Sans Arabic",
            ]),
        },
    );
    entries.insert(
        "fr".to_string(),
        LanguagePatternEntry {
            exact_phrases: vec![
                "Listes de lecture".to_string(),
                "Liste de lecture".to_string(),
            ],
            fallback_token: None,
            rtl: false,
            original_trigger_phrases: reading_lists(),
            fallback_fonts: Vec::new(),
        },
    );
    entries.insert(
        "zh".to_string(),
        script_fonts(regular_fonts(&["Noto Sans SC", "Source Han Sans CN", "Microsoft YaHei"])),
    );
    entries.insert(
        "ja".to_string(),
        script_fonts(vec![
            FontRef::new("Noto Sans JP", "Regular"),
            FontRef::new("Hiragino Sans", "W3"),
            FontRef::new("Meiryo", "Regular"),
        ]),
    );
    entries.insert(
        "ko".to_string(),
        script_fonts(regular_fonts(&["Noto Sans KR", "Malgun Gothic"])),
    );
    entries.insert(
        "ru".to_string(),
        script_fonts(regular_fonts(&["Noto Sans", "Roboto"])),
    );
    LanguagePatternTable { entries }
});

#[derive(Clone, Debug, Default)]
pub struct LanguagePatternTable {
    entries: HashMap<String, LanguagePatternEntry>,
}

impl LanguagePatternTable {
    pub fn builtin() -> &'static LanguagePatternTable {
        &BUILTIN
    }

    /// Built-in entries with `overrides` layered on top (per language, whole entry).
    pub fn with_overrides(overrides: &HashMap<String, LanguagePatternEntry>) -> Self {
        let mut table = LanguagePatternTable::clone(&BUILTIN);
        for (lang, entry) in overrides {
            table.entries.insert(normalize_lang(lang), entry.clone());
        }
        table
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn patterns_for(&self, lang: &str) -> &LanguagePatternEntry {
        self.entries.get(&normalize_lang(lang)).unwrap_or(&*EMPTY_ENTRY)
    }

    pub fn has_trigger_phrase(&self, text: &str, lang: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.patterns_for(lang)
            .original_trigger_phrases
            .iter()
            .any(|p| lower.contains(&p.to_lowercase()))
    }

    /// The language's own fallback fonts followed by Arial and Segoe UI. Empty for languages
    /// without a font list.
    pub fn fallback_font_chain(&self, lang: &str) -> Vec<FontRef> {
        let mut chain = self.patterns_for(lang).fallback_fonts.clone();
        if chain.is_empty() {
            return chain;
        }
        for font in regular_fonts(&SHARED_FALLBACK_FONTS) {
            if !chain.contains(&font) {
                chain.push(font);
            }
        }
        chain
    }

    /// Table flag OR known RTL language OR RTL script anywhere in `text`.
    pub fn is_rtl(&self, lang: &str, text: &str) -> bool {
        let code = normalize_lang(lang);
        self.patterns_for(&code).rtl
            || RTL_LANGUAGES.contains(&code.as_str())
            || contains_rtl_script(text)
    }
}

/// Lowercased primary subtag: "hi-IN" -> "hi".
pub fn normalize_lang(lang: &str) -> String {
    lang.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}
