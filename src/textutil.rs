use once_cell::sync::Lazy;
use regex::Regex;

use crate::style::TextSpan;

static RTL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\u0590-\u05FF\u0600-\u06FF\u0750-\u077F\u08A0-\u08FF\uFB1D-\uFDFF\uFE70-\uFEFF]")
        .expect("rtl regex")
});

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

pub fn char_offset(text: &str, byte_idx: usize) -> usize {
    text[..byte_idx.min(text.len())].chars().count()
}

/// Slice by char offsets; out-of-range ends are clamped.
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let b0 = byte_offset(text, start);
    let b1 = byte_offset(text, end.max(start));
    &text[b0..b1]
}

pub fn span_text(text: &str, span: TextSpan) -> &str {
    char_slice(text, span.start, span.end)
}

pub fn find_chars(haystack: &str, needle: &str) -> Option<usize> {
    haystack.find(needle).map(|b| char_offset(haystack, b))
}

pub fn find_chars_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let b0 = byte_offset(haystack, from);
    haystack[b0..]
        .find(needle)
        .map(|b| char_offset(haystack, b0 + b))
}

fn eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Case-insensitive search comparing char by char, so the span length always equals the
/// needle's char count.
pub fn find_ci(haystack: &str, needle: &str) -> Option<TextSpan> {
    let hay: Vec<char> = haystack.chars().collect();
    let pat: Vec<char> = needle.chars().collect();
    if pat.is_empty() || pat.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - pat.len())
        .find(|&i| {
            hay[i..i + pat.len()]
                .iter()
                .zip(&pat)
                .all(|(a, b)| eq_ignore_case(*a, *b))
        })
        .map(|i| TextSpan::new(i, i + pat.len()))
}

/// Char spans of maximal non-whitespace runs.
pub fn word_spans(text: &str) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut idx = 0usize;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                spans.push(TextSpan::new(s, idx));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
        idx += 1;
    }
    if let Some(s) = start {
        spans.push(TextSpan::new(s, idx));
    }
    spans
}

pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

pub fn contains_rtl_script(text: &str) -> bool {
    RTL_RE.is_match(text)
}

/// Shorten for log lines, marking the cut with an ellipsis.
pub fn preview(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}
