//! Locating the span of a translated string that corresponds to a styled run.

mod hints;
mod rules;

use tracing::debug;

use crate::patterns::LanguagePatternTable;
use crate::structure::{analyze, TextStructure};
use crate::style::TextSpan;
use crate::textutil::{char_len, char_slice, preview};

pub use hints::{locate_translated_phrase, plan_from_style_mapping, run_for_mapping};
pub use rules::{
    find_phrase_in_language, ConnectorRule, DictionaryRule, LeadingRule, ProportionalRule,
    TrailingRule,
};

pub struct RemapContext<'a> {
    pub run: TextSpan,
    /// Original text under `run`, untrimmed.
    pub run_text: &'a str,
    pub original: &'a str,
    pub translated: &'a str,
    pub target_lang: &'a str,
    pub table: &'a LanguagePatternTable,
    pub original_structure: &'a TextStructure,
    pub translated_structure: &'a TextStructure,
}

pub trait RemapRule {
    fn name(&self) -> &'static str;

    fn remap(&self, ctx: &RemapContext<'_>) -> Option<TextSpan>;
}

pub const DEFAULT_CASCADE: &[&dyn RemapRule] = &[
    &DictionaryRule,
    &LeadingRule,
    &TrailingRule,
    &ConnectorRule,
    &ProportionalRule,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemapHit {
    pub span: TextSpan,
    pub rule: &'static str,
}

pub struct PositionRemapper<'a> {
    original: &'a str,
    translated: &'a str,
    target_lang: &'a str,
    table: &'a LanguagePatternTable,
    original_structure: TextStructure,
    translated_structure: TextStructure,
    rules: &'a [&'a dyn RemapRule],
}

impl<'a> PositionRemapper<'a> {
    pub fn new(
        original: &'a str,
        translated: &'a str,
        target_lang: &'a str,
        table: &'a LanguagePatternTable,
    ) -> Self {
        Self::with_rules(original, translated, target_lang, table, DEFAULT_CASCADE)
    }

    pub fn with_rules(
        original: &'a str,
        translated: &'a str,
        target_lang: &'a str,
        table: &'a LanguagePatternTable,
        rules: &'a [&'a dyn RemapRule],
    ) -> Self {
        Self {
            original,
            translated,
            target_lang,
            table,
            original_structure: analyze(original),
            translated_structure: analyze(translated),
            rules,
        }
    }

    /// Span in the translated text for the original run `run`, or `None` when no rule
    /// produced a non-empty span.
    pub fn remap(&self, run: TextSpan) -> Option<RemapHit> {
        let tlen = char_len(self.translated);
        let ctx = RemapContext {
            run,
            run_text: char_slice(self.original, run.start, run.end),
            original: self.original,
            translated: self.translated,
            target_lang: self.target_lang,
            table: self.table,
            original_structure: &self.original_structure,
            translated_structure: &self.translated_structure,
        };

        for rule in self.rules {
            let Some(span) = rule.remap(&ctx) else {
                continue;
            };
            let span = span.clamped(tlen);
            if span.is_empty() {
                debug!(rule = rule.name(), "rule produced an empty span");
                continue;
            }
            debug!(
                rule = rule.name(),
                run = %preview(ctx.run_text, 40),
                mapped = %preview(char_slice(self.translated, span.start, span.end), 40),
                "remapped run"
            );
            return Some(RemapHit {
                span,
                rule: rule.name(),
            });
        }
        debug!(run = %preview(ctx.run_text, 40), "no remap rule matched");
        None
    }
}
