mod config;
mod memory;
mod trace;
mod translator;

pub use config::{init_default_config, PipelineArgs, PipelineConfig};
pub use memory::TranslationMemory;
pub use trace::TraceWriter;
pub use translator::{NodeOutcome, TranslateReport, TranslatorPipeline};
