use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use style_remap::document::{load_tree, save_tree};
use style_remap::pipeline::{init_default_config, PipelineArgs, PipelineConfig, TranslatorPipeline};
use style_remap::progress::ConsoleProgress;
use style_remap::service::GlossaryService;

#[derive(Parser, Debug)]
#[command(name = "style-remap")]
#[command(about = "Translate styled text nodes and carry their run styles over", long_about = None)]
struct Args {
    /// Generate a default config + glossary, then exit
    #[arg(long)]
    init_config: bool,

    /// Directory to write config files (default: current directory)
    #[arg(long, value_name = "DIR")]
    init_config_dir: Option<PathBuf>,

    /// Overwrite existing files when used with --init-config
    #[arg(long)]
    force: bool,

    /// Input node tree (JSON)
    #[arg(value_name = "JSON")]
    input: Option<PathBuf>,

    /// Output node tree (default: <input_stem>.<lang>.json)
    #[arg(short, long, value_name = "JSON")]
    output: Option<PathBuf>,

    /// Target language code (e.g. es, hi, ar)
    #[arg(long)]
    target_lang: Option<String>,

    /// Config file path (default: search for style-remap.toml upwards)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Glossary JSON for the offline service (overrides [service] glossary)
    #[arg(long, value_name = "JSON")]
    glossary: Option<PathBuf>,

    /// Node filter rules TOML (replaces the [filter] section)
    #[arg(long, value_name = "TOML")]
    filter_rules: Option<PathBuf>,

    /// Re-apply only the dominant style
    #[arg(long)]
    no_preserve_styles: bool,

    /// Skip the translation memory
    #[arg(long)]
    force_retranslate: bool,

    /// Send styled phrases to the service and use the mappings it returns
    #[arg(long)]
    request_style_hints: bool,

    /// Stop starting new nodes after N seconds (0 disables)
    #[arg(long, value_name = "N")]
    timeout_secs: Option<u64>,

    /// Debug logging (RUST_LOG wins when set)
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "style_remap=debug" } else { "style_remap=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let progress = ConsoleProgress::new(true);

    if args.init_config {
        let dir = args
            .init_config_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let cfg_path = init_default_config(&dir, args.force).context("init default config")?;
        eprintln!("Wrote config: {}", cfg_path.display());
        return Ok(());
    }

    let input = match args.input {
        Some(p) => p,
        None => {
            let mut cmd = Args::command();
            cmd.print_help().context("print help")?;
            eprintln!(
                "\n\nUSAGE:\n  style-remap <tree.json> --target-lang es\n\nTIPS:\n  - Run with --init-config to get a commented style-remap.toml.\n  - Default config search: style-remap.toml (upwards), or set STYLE_REMAP_CONFIG.\n"
            );
            return Ok(());
        }
    };

    let pipeline_args = PipelineArgs {
        target_lang: args.target_lang,
        glossary: args.glossary,
        filter_rules: args.filter_rules,
        no_preserve_styles: args.no_preserve_styles,
        force_retranslate: args.force_retranslate,
        request_style_hints: args.request_style_hints,
        timeout_secs: args.timeout_secs,
    };
    let provisional_output = args.output.clone().unwrap_or_else(|| input.clone());
    let cfg = PipelineConfig::from_paths_and_args(
        &input,
        &provisional_output,
        args.config,
        pipeline_args,
    )
    .context("build config")?;

    let output = match args.output {
        Some(p) => p,
        None => {
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output")
                .to_string();
            input.with_file_name(format!("{stem}.{}.json", cfg.target_lang))
        }
    };

    let service = match cfg.glossary.as_ref() {
        Some(path) if path.exists() => {
            progress.info(format!("Glossary: {}", path.display()));
            GlossaryService::from_json_path(path)?
        }
        Some(path) => {
            tracing::warn!(
                path = %path.display(),
                "glossary not found; every text will use the fallback"
            );
            GlossaryService::new()
        }
        None => GlossaryService::new(),
    };

    progress.info(format!("Read tree: {}", input.display()));
    let mut root = load_tree(&input)?;

    let mut pipeline = TranslatorPipeline::new(cfg, Box::new(service), progress)?;
    let report = pipeline.translate_tree(&mut root)?;

    save_tree(&output, &root)?;
    eprintln!("Write output: {}", output.display());
    if report.nodes_failed > 0 {
        eprintln!("{} node(s) failed; see the log for details", report.nodes_failed);
    }
    Ok(())
}
