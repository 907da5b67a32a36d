use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::filter::NodeFilterRules;
use crate::patterns::LanguagePatternEntry;
use crate::style::FontRef;

pub const CONFIG_FILENAME: &str = "style-remap.toml";
pub const CONFIG_ENV: &str = "STYLE_REMAP_CONFIG";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub filter: NodeFilterRules,
    #[serde(default)]
    pub service: ServiceSection,
    /// Extra or replacement phrase tables, keyed by language code.
    #[serde(default)]
    pub languages: HashMap<String, LanguagePatternEntry>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PipelineSection {
    #[serde(default)]
    pub target_lang: Option<String>,

    /// When false only the dominant style is re-applied after translation.
    #[serde(default)]
    pub preserve_styles: Option<bool>,
    /// Send the special runs' text and color to the service so it can return style mappings.
    #[serde(default)]
    pub request_style_hints: Option<bool>,
    #[serde(default)]
    pub force_retranslate: Option<bool>,

    /// 0 disables the timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub fallback_font: Option<FontRef>,

    #[serde(default)]
    pub isolate_mixed_content: Option<bool>,

    #[serde(default)]
    pub trace_dir: Option<String>,

    #[serde(default)]
    pub overflow_tolerance: Option<f32>,

    #[serde(default)]
    pub memory_capacity: Option<usize>,

    /// Optional standalone filter rules TOML; replaces the `[filter]` section when set.
    #[serde(default)]
    pub filter_rules: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ServiceSection {
    /// Glossary JSON used by the offline service.
    #[serde(default)]
    pub glossary: Option<String>,
}

pub fn find_file_upwards(start_dir: &Path, filename: &str, max_levels: usize) -> Option<PathBuf> {
    let mut dir = start_dir;
    for _ in 0..=max_levels {
        let candidate = dir.join(filename);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
    None
}

pub fn find_default_config(workdir: &Path, filename: &str) -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(p) = find_file_upwards(&cwd, filename, 8) {
            return Some(p);
        }
    }
    if let Some(p) = find_file_upwards(workdir, filename, 8) {
        return Some(p);
    }
    let exe = std::env::current_exe().ok()?;
    find_file_upwards(exe.parent()?, filename, 10)
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: AppConfig = toml::from_str(&text).context("parse config toml")?;
    cfg.filter
        .validate()
        .with_context(|| format!("[filter] in {}", path.display()))?;
    Ok(cfg)
}

/// `path` as given when absolute, otherwise relative to `base`.
pub fn resolve_relative(base: &Path, path: &str) -> PathBuf {
    let p = PathBuf::from(path.trim());
    if p.is_relative() {
        base.join(p)
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_parse() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[pipeline]
target_lang = "fr"
timeout_secs = 30
fallback_font = { family = "Roboto", style = "Regular" }

[filter]
skip_urls_emails = true

[service]
glossary = "glossary.json"

[languages.de]
exact_phrases = ["Leselisten", "Leseliste"]
original_trigger_phrases = ["reading list"]
"#,
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.pipeline.target_lang.as_deref(), Some("fr"));
        assert_eq!(cfg.pipeline.timeout_secs, Some(30));
        assert_eq!(
            cfg.pipeline.fallback_font,
            Some(FontRef::new("Roboto", "Regular"))
        );
        assert!(cfg.filter.skip_urls_emails);
        assert_eq!(cfg.service.glossary.as_deref(), Some("glossary.json"));
        assert_eq!(cfg.languages["de"].exact_phrases.len(), 2);
    }

    #[test]
    fn bad_filter_version_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[filter]\nversion = 3\n").expect("write");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn upward_search_finds_parent_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("mkdir");
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").expect("write");

        let found = find_file_upwards(&nested, CONFIG_FILENAME, 4).expect("found");
        assert_eq!(found, dir.path().join(CONFIG_FILENAME));
        assert_eq!(find_file_upwards(&nested, CONFIG_FILENAME, 1), None);
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/etc/style-remap");
        assert_eq!(
            resolve_relative(base, "glossary.json"),
            base.join("glossary.json")
        );
        assert_eq!(resolve_relative(base, "/tmp/g.json"), PathBuf::from("/tmp/g.json"));
    }
}
