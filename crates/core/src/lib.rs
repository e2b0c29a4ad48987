//! Anime reference tables from YouTube video transcripts.
//!
//! A video's transcript and its description timestamps go to a language
//! model, which answers with a markdown table of the anime mentioned. The
//! table is written out as CSV and recorded in a JSON registry.

pub mod cache;
pub mod config;
pub mod error;
pub mod extractor;
pub mod format;
pub mod generate;
pub mod markdown;
pub mod prompt;
pub mod provider;
pub mod registry;
pub mod sse;
pub mod timestamps;
pub mod viewer;
pub mod youtube;

pub use config::ExtractorConfig;
pub use error::{AnimerefError, Result};
pub use extractor::{AnimeExtractor, ExtractedTable, build_reference_table};
pub use format::{format_table_readable, format_timestamps};
pub use generate::{
    FragmentStream, HttpGenerator, TextGenerator, collect_response, fragment_stream,
};
pub use markdown::{MarkdownTable, parse_markdown_table};
pub use provider::{Provider, ProviderConfig};
pub use registry::{CsvRegistry, register_file};
pub use timestamps::{TimestampEntry, TimestampMap, extract_timestamps};
pub use viewer::{SortColumn, TableQuery, read_csv_table, timestamp_to_seconds};
pub use youtube::{
    TranscriptSource, VideoMetadataSource, VideoRef, YtDlp, sanitize_filename, video_id_from_url,
};
