use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnimerefError {
    #[error("Transcript unavailable for {video_id}: {reason}")]
    TranscriptUnavailable { video_id: String, reason: String },

    #[error("Metadata unavailable for {url}: {reason}")]
    MetadataUnavailable { url: String, reason: String },

    #[error("Text generation failed: {reason}")]
    GenerationFailed { reason: String },

    #[error("Text generation timed out after {0:?}")]
    GenerationTimeout(Duration),

    #[error("No markdown table found in the response")]
    NoTableFound,

    #[error("Could not extract a video id from {input}")]
    InvalidVideo { input: String },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: &'static str },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

impl AnimerefError {
    /// True for failures that happened while producing or reading the model output.
    pub fn is_generation(&self) -> bool {
        matches!(
            self,
            AnimerefError::GenerationFailed { .. } | AnimerefError::GenerationTimeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AnimerefError>;
