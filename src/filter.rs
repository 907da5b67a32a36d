use std::path::Path;

use anyhow::{anyhow, Context};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static UI_ELEMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(button|menu|close|back|next|done|cancel|submit|ok|yes|no)$")
        .expect("ui element regex")
});
static URL_EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:http|www\.|mailto:|[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,})")
        .expect("url regex")
});
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}|\d{1,2}:\d{2})").expect("date regex")
});
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(placeholder|lorem ipsum|dummy)").expect("placeholder regex"));

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFilterRules {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub skip_ui_elements: bool,

    #[serde(default)]
    pub skip_urls_emails: bool,

    #[serde(default)]
    pub skip_dates: bool,

    #[serde(default)]
    pub skip_placeholders: bool,

    /// Node name globs; `*` matches any run of chars.
    #[serde(default)]
    pub skip_names: Vec<String>,
}

fn default_version() -> u32 {
    1
}

impl Default for NodeFilterRules {
    fn default() -> Self {
        Self {
            version: 1,
            skip_ui_elements: false,
            skip_urls_emails: false,
            skip_dates: false,
            skip_placeholders: false,
            skip_names: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    TooShort,
    UiElement,
    UrlOrEmail,
    Date,
    Placeholder,
    Name(String),
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::TooShort => "too short",
            SkipReason::UiElement => "ui element",
            SkipReason::UrlOrEmail => "url or email",
            SkipReason::Date => "date or time",
            SkipReason::Placeholder => "placeholder",
            SkipReason::Name(_) => "name pattern",
        }
    }
}

impl NodeFilterRules {
    pub fn from_toml_path(path: &Path) -> anyhow::Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read filter rules: {}", path.display()))?;
        let s = String::from_utf8(bytes).context("filter rules must be utf-8")?;
        let rules: NodeFilterRules = toml::from_str(&s).context("parse filter rules (toml)")?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.version != 1 {
            return Err(anyhow!(
                "unsupported filter rules version: {} (expected 1)",
                self.version
            ));
        }
        Ok(())
    }

    /// Why a node with `name` and `text` should be left untranslated, if it should.
    pub fn skip_reason(&self, name: &str, text: &str) -> Option<SkipReason> {
        let text = text.trim();
        if text.chars().count() <= 1 {
            return Some(SkipReason::TooShort);
        }
        if self.skip_ui_elements && UI_ELEMENT_RE.is_match(text) {
            return Some(SkipReason::UiElement);
        }
        if self.skip_urls_emails && URL_EMAIL_RE.is_match(text) {
            return Some(SkipReason::UrlOrEmail);
        }
        if self.skip_dates && DATE_RE.is_match(text) {
            return Some(SkipReason::Date);
        }
        if self.skip_placeholders && PLACEHOLDER_RE.is_match(text) {
            return Some(SkipReason::Placeholder);
        }
        self.skip_names
            .iter()
            .find(|p| wildcard_match(p, name))
            .map(|p| SkipReason::Name(p.clone()))
    }
}

/// Glob match where `*` stands for any (possibly empty) run of chars.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }
    let segments: Vec<&str> = pattern.split('*').collect();
    let (head, tail) = (segments[0], segments[segments.len() - 1]);
    if !text.starts_with(head) {
        return false;
    }
    let mut rest = &text[head.len()..];
    for seg in &segments[1..segments.len() - 1] {
        match rest.find(seg) {
            Some(pos) => rest = &rest[pos + seg.len()..],
            None => return false,
        }
    }
    rest.len() >= tail.len() && rest.ends_with(tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_on() -> NodeFilterRules {
        NodeFilterRules {
            skip_ui_elements: true,
            skip_urls_emails: true,
            skip_dates: true,
            skip_placeholders: true,
            skip_names: vec!["icon/*".to_string(), "*-debug".to_string()],
            ..NodeFilterRules::default()
        }
    }

    #[test]
    fn short_text_is_always_skipped() {
        let rules = NodeFilterRules::default();
        assert_eq!(rules.skip_reason("t", "  x "), Some(SkipReason::TooShort));
        assert_eq!(rules.skip_reason("t", ""), Some(SkipReason::TooShort));
        assert_eq!(rules.skip_reason("t", "Cancel"), None);
    }

    #[test]
    fn switches_only_apply_when_enabled() {
        let rules = all_on();
        assert_eq!(rules.skip_reason("t", "Cancel"), Some(SkipReason::UiElement));
        assert_eq!(
            rules.skip_reason("t", "https://example.com"),
            Some(SkipReason::UrlOrEmail)
        );
        assert_eq!(
            rules.skip_reason("t", "team@example.org"),
            Some(SkipReason::UrlOrEmail)
        );
        assert_eq!(rules.skip_reason("t", "12/04/2024"), Some(SkipReason::Date));
        assert_eq!(rules.skip_reason("t", "09:30"), Some(SkipReason::Date));
        assert_eq!(
            rules.skip_reason("t", "Lorem ipsum dolor"),
            Some(SkipReason::Placeholder)
        );
        assert_eq!(rules.skip_reason("t", "Cancel subscription"), None);
        assert_eq!(rules.skip_reason("t", "Meet at 09:30"), None);
    }

    #[test]
    fn name_globs() {
        let rules = all_on();
        assert_eq!(
            rules.skip_reason("icon/close", "Close window"),
            Some(SkipReason::Name("icon/*".to_string()))
        );
        assert!(rules.skip_reason("label-debug", "Hello there").is_some());
        assert!(rules.skip_reason("label", "Hello there").is_none());
    }

    #[test]
    fn wildcard_segments() {
        assert!(wildcard_match("*", "anything"));
        assert!(wildcard_match("a*c*e", "abcde"));
        assert!(!wildcard_match("a*c*e", "abcd"));
        assert!(wildcard_match("ab*b", "abb"));
        assert!(!wildcard_match("ab*ba", "aba"));
        assert!(wildcard_match("ab*b", "abxb"));
        assert!(wildcard_match("exact", "exact"));
        assert!(!wildcard_match("exact", "exactly"));
    }

    #[test]
    fn rules_load_from_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("filter.toml");
        std::fs::write(&path, "version = 1\nskip_dates = true\nskip_names = [\"tmp*\"]\n")
            .expect("write");
        let rules = NodeFilterRules::from_toml_path(&path).expect("load");
        assert!(rules.skip_dates);
        assert!(!rules.skip_ui_elements);
        assert_eq!(rules.skip_names, vec!["tmp*".to_string()]);

        std::fs::write(&path, "version = 2\n").expect("write");
        assert!(NodeFilterRules::from_toml_path(&path).is_err());
    }
}
