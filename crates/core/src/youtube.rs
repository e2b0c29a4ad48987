//! YouTube collaborators: transcripts, titles and descriptions.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::{fs, process::Command};
use tracing::debug;

use crate::error::{AnimerefError, Result};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const INVALID_FILENAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const MAX_FILENAME_CHARS: usize = 100;

/// A YouTube video, identified by its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub id: String,
}

impl VideoRef {
    /// Accepts a bare video id or a watch/short URL.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let id = if input.contains("youtu") {
            video_id_from_url(input)
        } else if !input.is_empty()
            && input
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            Some(input.to_string())
        } else {
            None
        };

        id.map(|id| Self { id })
            .ok_or_else(|| AnimerefError::InvalidVideo {
                input: input.to_string(),
            })
    }

    pub fn url(&self) -> String {
        format!("{}{}", WATCH_URL, self.id)
    }
}

/// Extract the id from `youtu.be/<id>` or `youtube.com/watch?v=<id>` URLs.
pub fn video_id_from_url(url: &str) -> Option<String> {
    let id = if let Some((_, rest)) = url.split_once("youtu.be/") {
        rest.split(['?', '&', '#']).next()
    } else if url.contains("youtube.com/watch") {
        url.split_once("v=")
            .and_then(|(_, rest)| rest.split(['&', '#']).next())
    } else {
        None
    };

    id.filter(|id| !id.is_empty()).map(String::from)
}

/// Replace characters that are invalid in file names and cap the length.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if INVALID_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_FILENAME_CHARS)
        .collect()
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Transcript text, one caption per line. `None` when the video has none.
    async fn transcript_text(
        &self,
        video: &VideoRef,
        language: Option<&str>,
    ) -> Result<Option<String>>;
}

#[async_trait]
pub trait VideoMetadataSource: Send + Sync {
    async fn title(&self, video: &VideoRef) -> Result<Option<String>>;
    async fn description(&self, video: &VideoRef) -> Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct VideoInfo {
    title: Option<String>,
    description: Option<String>,
}

/// Talks to YouTube through the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
        }
    }
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn video_info(&self, video: &VideoRef) -> Result<VideoInfo> {
        let output = Command::new(&self.binary)
            .arg("-J")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg(video.url())
            .output()
            .await?;

        if !output.status.success() {
            return Err(AnimerefError::ToolFailed {
                tool: "yt-dlp",
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    async fn download_subtitles(
        &self,
        video: &VideoRef,
        language: &str,
        dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let output_template = dir.join("subs.%(ext)s");
        let output = Command::new(&self.binary)
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-langs")
            .arg(language)
            .arg("--sub-format")
            .arg("json3")
            .arg("--no-warnings")
            .arg("-o")
            .arg(&output_template)
            .arg(video.url())
            .output()
            .await?;

        if !output.status.success() {
            return Err(AnimerefError::ToolFailed {
                tool: "yt-dlp",
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut found = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json3") {
                found.push(path);
            }
        }
        found.sort();
        Ok(found.into_iter().next())
    }
}

#[async_trait]
impl TranscriptSource for YtDlp {
    async fn transcript_text(
        &self,
        video: &VideoRef,
        language: Option<&str>,
    ) -> Result<Option<String>> {
        let dir = tempfile::tempdir()?;
        let language = language.unwrap_or("en");

        let Some(subtitles) = self.download_subtitles(video, language, dir.path()).await? else {
            debug!(video = %video.id, language, "no subtitles available");
            return Ok(None);
        };

        let content = fs::read_to_string(&subtitles).await?;
        let text = json3_to_text(&content)?;
        Ok(Some(text).filter(|t| !t.trim().is_empty()))
    }
}

#[async_trait]
impl VideoMetadataSource for YtDlp {
    async fn title(&self, video: &VideoRef) -> Result<Option<String>> {
        Ok(self.video_info(video).await?.title)
    }

    async fn description(&self, video: &VideoRef) -> Result<Option<String>> {
        Ok(self.video_info(video).await?.description)
    }
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Flatten a YouTube `json3` caption track into one caption per line.
pub fn json3_to_text(content: &str) -> Result<String> {
    let track: Json3 = serde_json::from_str(content)?;
    let mut text = String::new();
    for event in track.events {
        let caption = event.segs.iter().map(|s| s.utf8.as_str()).collect::<String>();
        let caption = caption.trim();
        if caption.is_empty() {
            continue;
        }
        text.push_str(caption);
        text.push('\n');
    }
    Ok(text)
}
