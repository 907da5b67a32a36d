use once_cell::sync::Lazy;
use regex::Regex;

use crate::style::TextSpan;
use crate::textutil::{char_len, char_offset};

pub const CANONICAL_BULLET: &str = "•";

static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"(?P<glyph>[•⁃⁌⁍∙◦≡→⟐◆◇⬧⦿⦾■□☐☑✓✔✕✗✘☓☒⊗⊠])\s*",
        r"|(?P<ascii>[-*+])\s+",
        r"|(?P<enum>(?:\d+|[A-Za-z\u0370-\u03FF\u0400-\u04FF\u05D0-\u05EA\u4E00-\u9FFF])[.)])(?:\s+|$)",
        r")(?P<rest>.*)$"
    ))
    .expect("bullet marker regex")
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulletItem {
    pub marker: Option<String>,
    /// Item text without marker or edge whitespace.
    pub clean: String,
    /// Char span of `clean` inside the analyzed text.
    pub clean_span: TextSpan,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulletList {
    pub items: Vec<BulletItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormattedList {
    pub text: String,
    /// Char span of each item's text inside `text`.
    pub item_spans: Vec<TextSpan>,
}

/// `Some` when `text` has at least two non-empty lines and one of them starts with a list
/// marker. Empty lines are dropped from the items.
pub fn detect_bullet_list(text: &str) -> Option<BulletList> {
    let mut items = Vec::new();
    let mut any_marker = false;
    let mut line_start = 0usize;

    for line in text.split('\n') {
        let offset = line_start;
        line_start += char_len(line) + 1;

        let body = line.trim_start();
        if body.trim().is_empty() {
            continue;
        }
        let lead = char_len(line) - char_len(body);

        let (marker, clean, clean_at) = match parse_marker(body.trim_end()) {
            Some((marker, rest_at)) => {
                any_marker = true;
                let rest = &body[rest_at..];
                (Some(marker), rest.trim_end(), char_offset(body, rest_at))
            }
            None => (None, body.trim_end(), 0),
        };
        let start = offset + lead + clean_at;
        items.push(BulletItem {
            marker,
            clean: clean.to_string(),
            clean_span: TextSpan::new(start, start + char_len(clean)),
        });
    }

    (items.len() >= 2 && any_marker).then_some(BulletList { items })
}

/// Marker text and the byte offset in `line` where the item text starts.
fn parse_marker(line: &str) -> Option<(String, usize)> {
    let caps = MARKER_RE.captures(line)?;
    let marker = caps
        .name("glyph")
        .or_else(|| caps.name("ascii"))
        .or_else(|| caps.name("enum"))?;
    let rest = caps.name("rest")?;
    Some((marker.as_str().to_string(), rest.start()))
}

/// One line per item with the canonical bullet; RTL lines carry it at the end. An empty item
/// becomes a bare bullet with an empty span.
pub fn format_items<S: AsRef<str>>(items: &[S], rtl: bool) -> FormattedList {
    let mut text = String::new();
    let mut item_spans = Vec::with_capacity(items.len());
    let mut offset = 0usize;
    let bullet_len = char_len(CANONICAL_BULLET) + 1;

    for (i, item) in items.iter().enumerate() {
        let item = item.as_ref().trim();
        if i > 0 {
            text.push('\n');
            offset += 1;
        }
        let len = char_len(item);
        if len == 0 {
            text.push_str(CANONICAL_BULLET);
            let at = if rtl { offset } else { offset + bullet_len - 1 };
            item_spans.push(TextSpan::new(at, at));
            offset += bullet_len - 1;
            continue;
        }
        if rtl {
            text.push_str(item);
            text.push(' ');
            text.push_str(CANONICAL_BULLET);
            item_spans.push(TextSpan::new(offset, offset + len));
        } else {
            text.push_str(CANONICAL_BULLET);
            text.push(' ');
            text.push_str(item);
            item_spans.push(TextSpan::new(offset + bullet_len, offset + bullet_len + len));
        }
        offset += len + bullet_len;
    }
    FormattedList { text, item_spans }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textutil::span_text;

    #[test]
    fn canonical_bullets_survive_translation() {
        let list = detect_bullet_list("• Red\n• Green\n• Blue").expect("list");
        let clean: Vec<&str> = list.items.iter().map(|i| i.clean.as_str()).collect();
        assert_eq!(clean, ["Red", "Green", "Blue"]);

        let out = format_items(&["Rojo", "Verde", "Azul"], false);
        let lines: Vec<&str> = out.text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.starts_with("• ")));
        assert_eq!(span_text(&out.text, out.item_spans[1]), "Verde");
    }

    #[test]
    fn marker_only_line_stays_a_bare_bullet() {
        let list = detect_bullet_list("•\n• Red").expect("list");
        assert_eq!(list.items[0].clean, "");

        let out = format_items(&["", "Rojo"], false);
        assert_eq!(out.text, "•\n• Rojo");
        assert!(out.item_spans[0].is_empty());
        assert_eq!(span_text(&out.text, out.item_spans[1]), "Rojo");

        let out = format_items(&["أحمر", ""], true);
        assert_eq!(out.text, "أحمر •\n•");
    }

    #[test]
    fn rtl_items_put_the_bullet_last() {
        let out = format_items(&["أحمر", "أخضر"], true);
        assert_eq!(out.text, "أحمر •\nأخضر •");
        assert_eq!(span_text(&out.text, out.item_spans[1]), "أخضر");
    }

    #[test]
    fn numbered_and_lettered_markers() {
        let list = detect_bullet_list("1. Open the file\n2) Save it").expect("list");
        assert_eq!(list.items[0].marker.as_deref(), Some("1."));
        assert_eq!(list.items[1].clean, "Save it");

        let list = detect_bullet_list("а) один\nб) два").expect("list");
        assert_eq!(list.items[1].marker.as_deref(), Some("б)"));
        assert_eq!(list.items[1].clean, "два");
    }

    #[test]
    fn clean_spans_point_into_the_source() {
        let text = "Shopping:\n  - milk \n\n  * eggs";
        let list = detect_bullet_list(text).expect("list");
        assert_eq!(list.items.len(), 3);
        assert_eq!(list.items[0].marker, None);
        for item in &list.items {
            assert_eq!(span_text(text, item.clean_span), item.clean);
        }
    }

    #[test]
    fn plain_text_is_not_a_list() {
        assert_eq!(detect_bullet_list("• Only one line"), None);
        assert_eq!(detect_bullet_list("Two\nplain lines"), None);
        assert_eq!(detect_bullet_list("e.g. this\nand that"), None);
        assert_eq!(detect_bullet_list("-5 degrees\n+3 today"), None);
    }
}
