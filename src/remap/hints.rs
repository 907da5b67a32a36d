use tracing::debug;

use crate::apply::PlanEntry;
use crate::service::StyleMapping;
use crate::style::{ClassifiedRun, TextSpan};
use crate::textutil::{char_len, char_slice, find_chars, find_ci, word_spans, words};

/// The run a mapping talks about: the first run whose text contains the mapped phrase or is
/// contained by it. Special runs are searched before default ones.
pub fn run_for_mapping<'r>(
    classified: &'r [ClassifiedRun],
    original: &str,
    mapped: &str,
) -> Option<&'r ClassifiedRun> {
    let needle = mapped.trim();
    if needle.is_empty() {
        return None;
    }
    let matches = |c: &&ClassifiedRun| {
        let text = char_slice(original, c.run.start, c.run.end).trim();
        !text.is_empty() && (text.contains(needle) || needle.contains(text))
    };
    classified
        .iter()
        .filter(|c| c.is_special())
        .find(matches)
        .or_else(|| classified.iter().find(matches))
}

/// Where `phrase` sits in `translated`: exact, then case-insensitive, then starting at the
/// first word that mentions the phrase's first word. The fuzzy span keeps the phrase length.
pub fn locate_translated_phrase(translated: &str, phrase: &str) -> Option<TextSpan> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return None;
    }
    let plen = char_len(phrase);
    if let Some(start) = find_chars(translated, phrase) {
        return Some(TextSpan::new(start, start + plen));
    }
    if let Some(span) = find_ci(translated, phrase) {
        return Some(span);
    }

    let first = words(phrase).first()?.to_lowercase();
    let tlen = char_len(translated);
    word_spans(translated)
        .into_iter()
        .find(|w| {
            char_slice(translated, w.start, w.end)
                .to_lowercase()
                .contains(&first)
        })
        .map(|w| TextSpan::new(w.start, (w.start + plen).min(tlen)))
}

/// Plan entries for every mapping that resolves on both sides. Unresolved mappings are
/// dropped.
pub fn plan_from_style_mapping(
    mappings: &[StyleMapping],
    classified: &[ClassifiedRun],
    original: &str,
    translated: &str,
) -> Vec<PlanEntry> {
    let mut entries = Vec::new();
    for mapping in mappings {
        let Some(run) = run_for_mapping(classified, original, &mapping.original_text) else {
            debug!(phrase = %mapping.original_text, "style mapping matches no run");
            continue;
        };
        let Some(span) = locate_translated_phrase(translated, &mapping.translated_text) else {
            debug!(phrase = %mapping.translated_text, "style mapping not found in translation");
            continue;
        };
        entries.push(PlanEntry::new(span, run.run.style.clone(), "service_mapping"));
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_runs;
    use crate::style::{Color, Paint, StyleRun, StyleSignature};

    fn accent() -> StyleSignature {
        StyleSignature {
            fills: vec![Paint::solid(Color::rgb(1.0, 0.3, 0.0))],
            ..StyleSignature::default()
        }
    }

    fn run(start: usize, end: usize, style: StyleSignature) -> StyleRun {
        StyleRun { start, end, style }
    }

    fn mapping(original: &str, translated: &str) -> StyleMapping {
        StyleMapping {
            original_text: original.to_string(),
            translated_text: translated.to_string(),
            color: None,
        }
    }

    #[test]
    fn locate_tries_exact_then_case_insensitive() {
        assert_eq!(
            locate_translated_phrase("Essai gratuit maintenant", "gratuit"),
            Some(TextSpan::new(6, 13))
        );
        assert_eq!(
            locate_translated_phrase("ESSAI GRATUIT", "Essai gratuit"),
            Some(TextSpan::new(0, 13))
        );
    }

    #[test]
    fn locate_falls_back_to_word_window() {
        // the service returned a phrase the translation inflects differently
        let translated = "Prueba las funciones nuevas hoy";
        let span = locate_translated_phrase(translated, "funciones nuevos").expect("span");
        assert_eq!(span.start, 11);
        assert_eq!(span.end, 27);
        assert_eq!(locate_translated_phrase(translated, "inexistente palabra"), None);
    }

    #[test]
    fn special_runs_are_matched_first() {
        let original = "Get Pro today";
        let runs = vec![
            run(0, 4, StyleSignature::default()),
            run(4, 7, accent()),
            run(7, 13, StyleSignature::default()),
        ];
        let classified = classify_runs(&runs);
        let run = run_for_mapping(&classified, original, "Get Pro").expect("run");
        assert_eq!(run.run.style, accent());
    }

    #[test]
    fn plan_uses_the_run_style() {
        let original = "Get Pro today";
        let translated = "Obtén Pro hoy";
        let runs = vec![
            run(0, 4, StyleSignature::default()),
            run(4, 7, accent()),
            run(7, 13, StyleSignature::default()),
        ];
        let classified = classify_runs(&runs);
        let plan = plan_from_style_mapping(
            &[mapping("Pro", "Pro"), mapping("missing", "nada")],
            &classified,
            original,
            translated,
        );
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].span, TextSpan::new(6, 9));
        assert_eq!(plan[0].style, accent());
    }
}
