use crate::patterns::LanguagePatternEntry;
use crate::style::TextSpan;
use crate::textutil::{char_len, find_chars, find_chars_from, word_spans};

use super::{RemapContext, RemapRule};

const FALLBACK_TOKEN_REACH: usize = 20;

/// Known phrasings of trigger phrases in the target language.
pub struct DictionaryRule;

/// Runs at the start of the original map onto the first ~30% of the translated words.
pub struct LeadingRule;

/// Runs at the end of the original map onto as many trailing translated words.
pub struct TrailingRule;

/// Runs equal to one side of a connector ("with", "by", ...) map onto the same side.
pub struct ConnectorRule;

/// Relative position, snapped outward to word boundaries. Only fails on empty text.
pub struct ProportionalRule;

/// Locate a dictionary phrasing inside `translated`. Falls back to the language's token,
/// then to the first two words.
pub fn find_phrase_in_language(
    translated: &str,
    entry: &LanguagePatternEntry,
) -> Option<TextSpan> {
    if translated.is_empty() {
        return None;
    }
    for phrase in &entry.exact_phrases {
        if let Some(start) = find_chars(translated, phrase) {
            return Some(TextSpan::new(start, start + char_len(phrase)));
        }
    }

    if let Some(token) = entry.fallback_token.as_deref().filter(|t| !t.is_empty()) {
        if let Some(start) = find_chars(translated, token) {
            let token_end = start + char_len(token);
            let end = find_chars_from(translated, " ", token_end).unwrap_or_else(|| {
                (start + FALLBACK_TOKEN_REACH)
                    .max(token_end)
                    .min(char_len(translated))
            });
            return Some(TextSpan::new(start, end));
        }
    }

    let spans = word_spans(translated);
    if spans.len() >= 2 {
        return Some(TextSpan::new(spans[0].start, spans[1].end));
    }
    None
}

impl RemapRule for DictionaryRule {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    fn remap(&self, ctx: &RemapContext<'_>) -> Option<TextSpan> {
        if !ctx.table.has_trigger_phrase(ctx.run_text.trim(), ctx.target_lang) {
            return None;
        }
        find_phrase_in_language(ctx.translated, ctx.table.patterns_for(ctx.target_lang))
    }
}

impl RemapRule for LeadingRule {
    fn name(&self) -> &'static str {
        "leading"
    }

    fn remap(&self, ctx: &RemapContext<'_>) -> Option<TextSpan> {
        let trimmed = ctx.run_text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if ctx.run.start != 0 && !ctx.original.trim_start().starts_with(trimmed) {
            return None;
        }

        let spans = word_spans(ctx.translated);
        if spans.is_empty() {
            return None;
        }
        let run_words = trimmed.split_whitespace().count();
        // ceil(0.3 * n) without float rounding surprises
        let share = (spans.len() * 3 + 9) / 10;
        let take = run_words.min(share).max(1);
        Some(TextSpan::new(0, spans[take - 1].end))
    }
}

impl RemapRule for TrailingRule {
    fn name(&self) -> &'static str {
        "trailing"
    }

    fn remap(&self, ctx: &RemapContext<'_>) -> Option<TextSpan> {
        let trimmed = ctx.run_text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if ctx.run.end < char_len(ctx.original) && !ctx.original.trim_end().ends_with(trimmed) {
            return None;
        }

        let spans = word_spans(ctx.translated);
        if spans.is_empty() {
            return None;
        }
        let run_words = trimmed.split_whitespace().count();
        let first = spans.len().saturating_sub(run_words);
        Some(TextSpan::new(spans[first].start, char_len(ctx.translated)))
    }
}

impl RemapRule for ConnectorRule {
    fn name(&self) -> &'static str {
        "connector"
    }

    fn remap(&self, ctx: &RemapContext<'_>) -> Option<TextSpan> {
        let original = ctx.original_structure.split.as_ref()?;
        let translated = ctx.translated_structure.split.as_ref()?;
        let trimmed = ctx.run_text.trim();

        let span = if trimmed == original.before {
            TextSpan::new(0, translated.connector_at)
        } else if trimmed == original.after {
            TextSpan::new(
                translated.connector_at + char_len(&translated.connector),
                char_len(ctx.translated),
            )
        } else {
            return None;
        };
        Some(trim_span(ctx.translated, span))
    }
}

impl RemapRule for ProportionalRule {
    fn name(&self) -> &'static str {
        "proportional"
    }

    fn remap(&self, ctx: &RemapContext<'_>) -> Option<TextSpan> {
        let chars: Vec<char> = ctx.translated.chars().collect();
        let tlen = chars.len();
        if tlen == 0 {
            return None;
        }
        let olen = char_len(ctx.original).max(1);
        let run_start = ctx.run.start.min(olen);
        let run_end = ctx.run.end.min(olen);

        let approx_start = (run_start * tlen / olen).min(tlen - 1);
        let approx_end = ((run_end * tlen).div_ceil(olen)).min(tlen);

        let start = chars[..=approx_start]
            .iter()
            .rposition(|c| c.is_whitespace())
            .map_or(0, |p| p + 1);
        let end = chars[approx_end..]
            .iter()
            .position(|c| c.is_whitespace())
            .map_or(tlen, |p| approx_end + p);
        if start < end {
            return Some(TextSpan::new(start, end));
        }

        // Both estimates fell on whitespace: take the nearest word.
        let spans = word_spans(ctx.translated);
        let word = spans
            .iter()
            .find(|w| w.end > approx_start)
            .or(spans.last())
            .copied();
        Some(word.unwrap_or(TextSpan::new(0, tlen)))
    }
}

fn trim_span(text: &str, span: TextSpan) -> TextSpan {
    let chars: Vec<char> = text
        .chars()
        .skip(span.start)
        .take(span.len())
        .collect();
    let lead = chars.iter().take_while(|c| c.is_whitespace()).count();
    let trail = chars[lead..]
        .iter()
        .rev()
        .take_while(|c| c.is_whitespace())
        .count();
    TextSpan::new(span.start + lead, span.start + chars.len() - trail)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::patterns::LanguagePatternTable;
    use crate::structure::analyze;
    use crate::textutil::{char_slice, span_text};

    fn apply(
        rule: &dyn RemapRule,
        original: &str,
        translated: &str,
        run: TextSpan,
    ) -> Option<TextSpan> {
        apply_lang(rule, original, translated, run, "es")
    }

    fn apply_lang(
        rule: &dyn RemapRule,
        original: &str,
        translated: &str,
        run: TextSpan,
        lang: &str,
    ) -> Option<TextSpan> {
        let table = LanguagePatternTable::builtin();
        let os = analyze(original);
        let ts = analyze(translated);
        let ctx = RemapContext {
            run,
            run_text: char_slice(original, run.start, run.end),
            original,
            translated,
            target_lang: lang,
            table,
            original_structure: &os,
            translated_structure: &ts,
        };
        rule.remap(&ctx)
    }

    #[test]
    fn dictionary_prefers_exact_phrase() {
        let entry = LanguagePatternTable::builtin().patterns_for("hi");
        let phrase = entry.exact_phrases[0].clone();
        let translated = format!("अपनी {phrase} देखें");
        let span = find_phrase_in_language(&translated, entry).expect("span");
        assert_eq!(span_text(&translated, span), phrase);
    }

    #[test]
    fn dictionary_token_extends_to_next_space() {
        let entry = LanguagePatternTable::builtin().patterns_for("hi");
        let token = entry.fallback_token.clone().expect("token");
        let translated = format!("मेरी {token}वाली किताबें यहाँ");
        let span = find_phrase_in_language(&translated, entry).expect("span");
        assert_eq!(span_text(&translated, span), format!("{token}वाली"));
    }

    #[test]
    fn dictionary_falls_back_to_first_two_words() {
        let entry = LanguagePatternTable::builtin().patterns_for("fr");
        let span = find_phrase_in_language("Vos lectures enregistrées", entry).expect("span");
        assert_eq!(span, TextSpan::new(0, 12));
        assert_eq!(find_phrase_in_language("Lectures", entry), None);
    }

    #[test]
    fn dictionary_needs_trigger_in_run() {
        let original = "Reading lists";
        let translated = "Listes de lecture";
        let hit = apply_lang(&DictionaryRule, original, translated, TextSpan::new(0, 13), "fr");
        assert_eq!(hit, Some(TextSpan::new(0, 17)));
        let miss = apply_lang(&DictionaryRule, "Bookmarks", "Favoris", TextSpan::new(0, 9), "fr");
        assert_eq!(miss, None);
    }

    #[test]
    fn leading_takes_at_most_thirty_percent() {
        let original = "Very important notice for all users of the app";
        let translated = "Aviso muy importante para todos los usuarios de la aplicación";
        // 3 run words, 10 translated words: ceil(3.0) = 3
        let span = apply(&LeadingRule, original, translated, TextSpan::new(0, 21)).expect("span");
        assert_eq!(span_text(translated, span), "Aviso muy importante");

        // 1 translated word still yields one word
        let span = apply(&LeadingRule, original, "Aviso", TextSpan::new(0, 21)).expect("span");
        assert_eq!(span, TextSpan::new(0, 5));
    }

    #[test]
    fn leading_skips_interior_runs() {
        let original = "Open the file now";
        assert_eq!(
            apply(&LeadingRule, original, "Abre el archivo ahora", TextSpan::new(5, 8)),
            None
        );
    }

    #[test]
    fn trailing_counts_from_the_end() {
        let original = "Try it free";
        let translated = "Pruébalo gratis ahora";
        let span = apply(&TrailingRule, original, translated, TextSpan::new(7, 11)).expect("span");
        assert_eq!(span_text(translated, span), "ahora");
    }

    #[test]
    fn connector_maps_after_half() {
        let original = "Sign up with Google";
        let translated = "Regístrate with Google";
        let span =
            apply(&ConnectorRule, original, translated, TextSpan::new(13, 19)).expect("span");
        assert_eq!(span_text(translated, span), "Google");
    }

    #[test]
    fn connector_needs_split_on_both_sides() {
        let original = "Sign up with Google";
        assert_eq!(
            apply(&ConnectorRule, original, "Regístrate con Google", TextSpan::new(0, 7)),
            None
        );
    }

    #[test]
    fn proportional_snaps_to_words() {
        let original = "aaaa bbbb cccc dddd";
        let translated = "wwww xxxx yyyy zzzz";
        let span =
            apply(&ProportionalRule, original, translated, TextSpan::new(5, 9)).expect("span");
        assert_eq!(span_text(translated, span), "xxxx");
    }

    #[test]
    fn proportional_fails_only_on_empty_translation() {
        assert_eq!(apply(&ProportionalRule, "abc", "", TextSpan::new(0, 3)), None);
        assert!(apply(&ProportionalRule, "", "x", TextSpan::new(0, 0)).is_some());
    }

    #[test]
    fn trim_span_drops_edge_whitespace() {
        assert_eq!(trim_span("  ab  cd ", TextSpan::new(0, 9)), TextSpan::new(2, 8));
        assert!(trim_span("   ", TextSpan::new(0, 3)).is_empty());
    }

    proptest! {
        #[test]
        fn proportional_is_total_and_word_aligned(
            original in "[a-z]{1,8}( [a-z]{1,8}){0,6}",
            translated in "[a-zé]{1,8}( [a-zé]{1,8}){0,8}",
            a in 0usize..64,
            b in 0usize..64,
        ) {
            let olen = char_len(&original);
            let (mut start, mut end) = (a.min(b) % (olen + 1), a.max(b) % (olen + 1));
            if start > end {
                std::mem::swap(&mut start, &mut end);
            }
            let span = apply(&ProportionalRule, &original, &translated, TextSpan::new(start, end))
                .expect("span");

            let chars: Vec<char> = translated.chars().collect();
            prop_assert!(span.start < span.end);
            prop_assert!(span.end <= chars.len());
            prop_assert!(span.start == 0 || chars[span.start - 1].is_whitespace());
            prop_assert!(span.end == chars.len() || chars[span.end].is_whitespace());
        }
    }
}
