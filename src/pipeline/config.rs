use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};

use crate::config::{
    find_default_config, load_config, resolve_relative, AppConfig, CONFIG_ENV, CONFIG_FILENAME,
};
use crate::filter::NodeFilterRules;
use crate::patterns::{normalize_lang, LanguagePatternTable};
use crate::style::FontRef;

const DEFAULT_OVERFLOW_TOLERANCE: f32 = 1.15;
const DEFAULT_MEMORY_CAPACITY: usize = 512;

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub workdir: PathBuf,
    pub config_path: PathBuf,

    pub target_lang: String,
    pub preserve_styles: bool,
    pub request_style_hints: bool,
    pub force_retranslate: bool,
    pub timeout: Option<Duration>,
    pub fallback_font: FontRef,
    pub isolate_mixed_content: bool,
    pub trace_dir: Option<PathBuf>,
    pub overflow_tolerance: f32,
    pub memory_capacity: usize,

    pub filter: NodeFilterRules,
    pub glossary: Option<PathBuf>,
    pub patterns: LanguagePatternTable,
}

/// Command-line values; each one set here wins over the config file.
#[derive(Clone, Debug, Default)]
pub struct PipelineArgs {
    pub target_lang: Option<String>,
    pub glossary: Option<PathBuf>,
    pub filter_rules: Option<PathBuf>,
    pub no_preserve_styles: bool,
    pub force_retranslate: bool,
    pub request_style_hints: bool,
    pub timeout_secs: Option<u64>,
}

impl PipelineConfig {
    /// Defaults for `target_lang` without any config file.
    pub fn for_target(target_lang: &str) -> Self {
        Self {
            workdir: PathBuf::from("."),
            config_path: PathBuf::from(CONFIG_FILENAME),
            target_lang: normalize_lang(target_lang),
            preserve_styles: true,
            request_style_hints: false,
            force_retranslate: false,
            timeout: None,
            fallback_font: FontRef::default(),
            isolate_mixed_content: true,
            trace_dir: None,
            overflow_tolerance: DEFAULT_OVERFLOW_TOLERANCE,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            filter: NodeFilterRules::default(),
            glossary: None,
            patterns: LanguagePatternTable::builtin().clone(),
        }
    }

    pub fn from_paths_and_args(
        input: &Path,
        output: &Path,
        config_path: Option<PathBuf>,
        args: PipelineArgs,
    ) -> anyhow::Result<Self> {
        let workdir = input
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let workdir = workdir.canonicalize().unwrap_or(workdir);

        let cfg_file = config_path
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
            .or_else(|| find_default_config(&workdir, CONFIG_FILENAME));

        let mut file_cfg = AppConfig::default();
        if let Some(p) = cfg_file.as_ref() {
            if p.exists() {
                file_cfg = load_config(p)?;
            }
        }
        let cfg_path = cfg_file.unwrap_or_else(|| workdir.join(CONFIG_FILENAME));
        let cfg_dir = cfg_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let section = &file_cfg.pipeline;

        let target_lang = args
            .target_lang
            .or_else(|| section.target_lang.clone())
            .map(|s| normalize_lang(&s))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                anyhow!("target language not set (use --target-lang or [pipeline] target_lang)")
            })?;

        let output_dir = output
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| workdir.clone());
        let trace_dir = section
            .trace_dir
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| resolve_relative(&output_dir, s));

        let filter = match args.filter_rules.or_else(|| {
            section
                .filter_rules
                .as_deref()
                .map(|s| resolve_relative(&cfg_dir, s))
        }) {
            Some(path) => NodeFilterRules::from_toml_path(&path)
                .with_context(|| format!("load filter rules: {}", path.display()))?,
            None => file_cfg.filter.clone(),
        };

        let glossary = args.glossary.or_else(|| {
            file_cfg
                .service
                .glossary
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(|s| resolve_relative(&cfg_dir, s))
        });

        let timeout = args
            .timeout_secs
            .or(section.timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let defaults = Self::for_target(&target_lang);
        Ok(Self {
            workdir,
            config_path: cfg_path,
            target_lang,
            preserve_styles: !args.no_preserve_styles
                && section.preserve_styles.unwrap_or(defaults.preserve_styles),
            request_style_hints: args.request_style_hints
                || section
                    .request_style_hints
                    .unwrap_or(defaults.request_style_hints),
            force_retranslate: args.force_retranslate
                || section.force_retranslate.unwrap_or(defaults.force_retranslate),
            timeout,
            fallback_font: section
                .fallback_font
                .clone()
                .unwrap_or(defaults.fallback_font),
            isolate_mixed_content: section
                .isolate_mixed_content
                .unwrap_or(defaults.isolate_mixed_content),
            trace_dir,
            overflow_tolerance: section
                .overflow_tolerance
                .filter(|t| t.is_finite() && *t > 0.0)
                .unwrap_or(defaults.overflow_tolerance),
            memory_capacity: section.memory_capacity.unwrap_or(defaults.memory_capacity),
            filter,
            glossary,
            patterns: LanguagePatternTable::with_overrides(&file_cfg.languages),
        })
    }
}

pub fn init_default_config(dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create config dir: {}", dir.display()))?;
    let cfg_path = dir.join(CONFIG_FILENAME);

    let glossary_path = dir.join("glossary.json");
    if !glossary_path.exists() || force {
        std::fs::write(&glossary_path, DEFAULT_GLOSSARY_JSON)
            .with_context(|| format!("write glossary: {}", glossary_path.display()))?;
    }

    if cfg_path.exists() && !force {
        return Ok(cfg_path);
    }
    std::fs::write(&cfg_path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("write config: {}", cfg_path.display()))?;
    Ok(cfg_path)
}

const DEFAULT_CONFIG_TOML: &str = r#"[pipeline]
target_lang = "es"

# Re-apply every styled run after translation. When false only the dominant style is kept.
preserve_styles = true
# Ask the service for phrase-level style mappings (sends each styled run's text and color).
request_style_hints = false
# Ignore the in-process translation memory.
force_retranslate = false

# Stop starting new nodes after this many seconds. 0 disables.
timeout_secs = 0

fallback_font = { family = "Inter", style = "Regular" }

# Wrap Latin words and numbers in directional isolates for RTL targets.
isolate_mixed_content = true

# Per-node trace files (relative to the output file). Comment out to disable.
# trace_dir = "_trace"

# Warn when translated length exceeds original * language factor * tolerance.
overflow_tolerance = 1.15
memory_capacity = 512

# filter_rules = "filter-rules.toml"

[filter]
version = 1
skip_ui_elements = false
skip_urls_emails = true
skip_dates = true
skip_placeholders = false
# Node name globs, `*` matches anything.
skip_names = []

[service]
glossary = "glossary.json"

# Phrase tables and fallback fonts replacing the built-in entry of a language
# (built-ins: hi, ar, fr, zh, ja, ko, ru). Arial and Segoe UI follow any font list.
# [languages.de]
# exact_phrases = ["Leselisten", "Leseliste"]
# fallback_token = "Lese"
# original_trigger_phrases = ["reading list", "reading lists"]
# fallback_fonts = [{ family = "Noto Sans", style = "Regular" }]
"#;

const DEFAULT_GLOSSARY_JSON: &str = r#"{
  "es": {
    "Reading lists": "Listas de lectura"
  }
}
"#;
