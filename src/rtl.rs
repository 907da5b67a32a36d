use tracing::{debug, warn};

use crate::host::{Direction, HostError, ParagraphProp, StyleValue, TextAlign, TextHost};
use crate::patterns::normalize_lang;
use crate::style::LetterSpacing;
use crate::textutil::char_len;

pub const LRI: char = '\u{2066}';
pub const PDI: char = '\u{2069}';

const PARAGRAPH_SPACING_FACTOR: f32 = 1.5;
const NUMERIC_PUNCT: &str = ".,:/%+-";
const LATIN_PUNCT: &str = "'’-._@";

/// Right-align, switch the paragraph to RTL and open up paragraph spacing. Arabic also gets
/// its letter-spacing reset to zero. Returns the number of failed writes.
pub fn adapt_paragraph<W: TextHost + ?Sized>(host: &mut W, lang: &str, font_size: f32) -> usize {
    let mut errors = 0;

    if let Err(err) = host.set_paragraph(ParagraphProp::Align(TextAlign::Right)) {
        warn!(error = %err, "set paragraph alignment failed");
        errors += 1;
    }
    match host.set_paragraph(ParagraphProp::Direction(Direction::Rtl)) {
        Ok(()) => {}
        Err(HostError::Unsupported(what)) => debug!(what, "host has no paragraph direction"),
        Err(err) => {
            warn!(error = %err, "set paragraph direction failed");
            errors += 1;
        }
    }

    let spacing = host
        .paragraph_spacing()
        .max(PARAGRAPH_SPACING_FACTOR * font_size);
    if let Err(err) = host.set_paragraph(ParagraphProp::Spacing(spacing)) {
        warn!(error = %err, "set paragraph spacing failed");
        errors += 1;
    }

    if normalize_lang(lang) == "ar" {
        let len = char_len(&host.characters());
        if len > 0 {
            if let Err(err) =
                host.set_range_style(0, len, StyleValue::LetterSpacing(LetterSpacing::ZERO))
            {
                warn!(error = %err, "reset letter spacing failed");
                errors += 1;
            }
        }
    }
    errors
}

/// Wrap numeric and Latin tokens in LRI…PDI and mirror brackets in the rest. Edge punctuation
/// stays outside the isolate. Whitespace is kept as is.
pub fn isolate_mixed_content(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut token = String::new();

    for ch in text.chars() {
        if ch.is_whitespace() {
            flush_token(&mut out, &mut token);
            out.push(ch);
        } else {
            token.push(ch);
        }
    }
    flush_token(&mut out, &mut token);
    out
}

fn flush_token(out: &mut String, token: &mut String) {
    if token.is_empty() {
        return;
    }
    let edge = |c: char| !c.is_alphanumeric();
    let start = token.len() - token.trim_start_matches(edge).len();
    let core = token[start..].trim_end_matches(edge);
    let end = start + core.len();
    if !core.is_empty() && (is_numeric_token(core) || is_latin_token(core)) {
        out.extend(token[..start].chars().map(mirror_bracket));
        out.push(LRI);
        out.push_str(core);
        out.push(PDI);
        out.extend(token[end..].chars().map(mirror_bracket));
    } else {
        out.extend(token.chars().map(mirror_bracket));
    }
    token.clear();
}

fn is_numeric_token(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || NUMERIC_PUNCT.contains(c))
}

fn is_latin_token(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_alphabetic())
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || LATIN_PUNCT.contains(c))
}

fn mirror_bracket(ch: char) -> char {
    match ch {
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '<' => '>',
        '>' => '<',
        other => other,
    }
}
