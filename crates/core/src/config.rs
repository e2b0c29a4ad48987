//! Extractor settings and their defaults.

use std::{path::PathBuf, time::Duration};

use crate::{cache::get_root_cache_dir, provider::Provider};

pub const DEFAULT_OUTPUT_DIR: &str = "transcripts";
pub const DEFAULT_REGISTRY_FILE: &str = "csv_config.json";
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Where transcripts, descriptions and CSV files are written.
    pub output_dir: PathBuf,
    /// Registry of produced CSV files.
    pub registry_path: PathBuf,
    pub cache_dir: PathBuf,
    /// Read fetched transcripts/descriptions from `cache_dir` when present.
    pub use_cache: bool,
    pub provider: Provider,
    /// Overrides the provider's default model.
    pub model: Option<String>,
    pub generation_timeout: Duration,
    /// Transcript language code; `None` lets the source choose.
    pub language: Option<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            registry_path: PathBuf::from(DEFAULT_REGISTRY_FILE),
            cache_dir: get_root_cache_dir(),
            use_cache: true,
            provider: Provider::default(),
            model: None,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            language: None,
        }
    }
}
