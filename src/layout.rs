use crate::patterns::normalize_lang;
use crate::textutil::char_len;

const DEFAULT_EXPANSION: f32 = 1.2;

const EXPANSION_FACTORS: [(&str, f32); 10] = [
    ("es", 1.3),
    ("fr", 1.25),
    ("de", 1.3),
    ("ru", 1.2),
    ("it", 1.25),
    ("pt", 1.2),
    ("hi", 1.0),
    ("ja", 0.6),
    ("zh", 0.5),
    ("ar", 1.25),
];

/// Expected translated/original char ratio for `lang`.
pub fn expansion_factor(lang: &str) -> f32 {
    let code = normalize_lang(lang);
    EXPANSION_FACTORS
        .iter()
        .find(|(l, _)| *l == code)
        .map_or(DEFAULT_EXPANSION, |(_, f)| *f)
}

pub fn overflow_suspected(original: &str, translated: &str, lang: &str, tolerance: f32) -> bool {
    let budget = char_len(original.trim()) as f32 * expansion_factor(lang) * tolerance.max(0.0);
    char_len(translated.trim()) as f32 > budget
}
