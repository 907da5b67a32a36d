use once_cell::sync::Lazy;
use regex::Regex;

use crate::textutil::char_offset;

static CONNECTOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^(.+?)\s+(with|using|by|in|on|for|to)\s+(.+)$").expect("connector regex")
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectorSplit {
    pub before: String,
    pub connector: String,
    pub after: String,
    /// Char offset of the connector word in the analyzed text.
    pub connector_at: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextStructure {
    pub words: Vec<String>,
    pub first_word: String,
    pub last_word: String,
    pub split: Option<ConnectorSplit>,
}

impl TextStructure {
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn has_connector(&self) -> bool {
        self.split.is_some()
    }
}

pub fn analyze(text: &str) -> TextStructure {
    let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    let first_word = words.first().cloned().unwrap_or_default();
    let last_word = words.last().cloned().unwrap_or_default();

    // Leading whitespace would otherwise be swallowed by the lazy `before` group.
    let trimmed = text.trim_start();
    let lead = text.len() - trimmed.len();
    let split = CONNECTOR_RE.captures(trimmed).and_then(|caps| {
        let before = caps.get(1)?;
        let connector = caps.get(2)?;
        let after = caps.get(3)?;
        Some(ConnectorSplit {
            before: before.as_str().trim().to_string(),
            connector: connector.as_str().to_string(),
            after: after.as_str().trim().to_string(),
            connector_at: char_offset(text, lead + connector.start()),
        })
    });

    TextStructure {
        words,
        first_word,
        last_word,
        split,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_and_edges() {
        let s = analyze("  Share  your reading lists ");
        assert_eq!(s.word_count(), 4);
        assert_eq!(s.first_word, "Share");
        assert_eq!(s.last_word, "lists");
        assert!(!s.has_connector());
    }

    #[test]
    fn first_connector_wins() {
        let s = analyze("Sign in with Google");
        let split = s.split.expect("split");
        assert_eq!(split.before, "Sign");
        assert_eq!(split.connector, "in");
        assert_eq!(split.after, "with Google");
        assert_eq!(split.connector_at, 5);
    }

    #[test]
    fn connector_is_case_insensitive_and_whole_word() {
        let s = analyze("Build WITH confidence");
        assert_eq!(s.split.as_ref().map(|x| x.connector.as_str()), Some("WITH"));

        let s = analyze("Bonjour tout le monde");
        assert!(!s.has_connector());
    }

    #[test]
    fn empty_text_has_no_words() {
        let s = analyze("");
        assert!(s.words.is_empty());
        assert_eq!(s.first_word, "");
        assert!(s.split.is_none());
    }
}
