//! Turning a video into an anime reference table on disk.

use std::{path::PathBuf, time::Duration};

use tokio::fs;
use tracing::{debug, info, trace, warn};

use crate::{
    cache::{
        get_description_path, get_transcript_path, get_video_cache_dir, read_cached, write_cached,
    },
    config::ExtractorConfig,
    error::{AnimerefError, Result},
    format::format_timestamps,
    generate::{HttpGenerator, TextGenerator, collect_response},
    markdown::{MarkdownTable, parse_markdown_table},
    prompt::reference_table_prompt,
    registry::register_file,
    timestamps::{TimestampMap, extract_timestamps},
    youtube::{TranscriptSource, VideoMetadataSource, VideoRef, YtDlp, sanitize_filename},
};

/// Ask `generator` for the reference table of `transcript` and parse its answer.
pub async fn build_reference_table<G>(
    transcript: &str,
    timestamps: &TimestampMap,
    generator: &G,
    timeout: Duration,
) -> Result<MarkdownTable>
where
    G: TextGenerator + ?Sized,
{
    let prompt = reference_table_prompt(transcript, &format_timestamps(timestamps));

    let mut received = 0;
    let response = collect_response(generator, &prompt, timeout, |fragment| {
        received += fragment.len();
        trace!(received, "received fragment");
    })
    .await?;
    debug!(bytes = response.len(), "generation finished");

    parse_markdown_table(&response)
}

/// Outcome of [`AnimeExtractor::process_video`].
#[derive(Debug)]
pub struct ExtractedTable {
    pub title: String,
    pub csv_path: PathBuf,
    pub table: MarkdownTable,
    pub timestamps: usize,
}

pub struct AnimeExtractor {
    config: ExtractorConfig,
    transcripts: Box<dyn TranscriptSource>,
    metadata: Box<dyn VideoMetadataSource>,
    generator: Option<Box<dyn TextGenerator>>,
}

impl AnimeExtractor {
    /// An extractor without a text generator can still fetch transcripts and
    /// descriptions; [`process_video`](Self::process_video) needs one.
    pub fn new(
        config: ExtractorConfig,
        transcripts: impl TranscriptSource + 'static,
        metadata: impl VideoMetadataSource + 'static,
    ) -> Self {
        Self {
            config,
            transcripts: Box::new(transcripts),
            metadata: Box::new(metadata),
            generator: None,
        }
    }

    /// `yt-dlp` for all YouTube data.
    pub fn from_config(config: ExtractorConfig) -> Self {
        Self::new(config, YtDlp::default(), YtDlp::default())
    }

    pub fn with_generator(mut self, generator: impl TextGenerator + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    /// Use the configured provider and model. Fails when its API key is missing.
    pub fn with_configured_generator(self) -> Result<Self> {
        let generator = HttpGenerator::new(self.config.provider, self.config.model.clone())?;
        info!(
            provider = generator.provider().name(),
            model = generator.model(),
            "using text generator"
        );
        Ok(self.with_generator(generator))
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Transcript text, from the cache when allowed.
    pub async fn transcript(&self, video: &VideoRef) -> Result<String> {
        let language = self.config.language.as_deref();
        let cache_path = get_transcript_path(
            &get_video_cache_dir(&self.config.cache_dir, &video.id),
            language,
        );

        if self.config.use_cache {
            if let Some(cached) = read_cached(&cache_path).await? {
                debug!(video = %video.id, "transcript cache hit");
                return Ok(cached);
            }
        }

        let transcript = self
            .transcripts
            .transcript_text(video, language)
            .await
            .map_err(|e| AnimerefError::TranscriptUnavailable {
                video_id: video.id.clone(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| AnimerefError::TranscriptUnavailable {
                video_id: video.id.clone(),
                reason: "no transcript found".to_string(),
            })?;

        if let Err(e) = write_cached(&cache_path, &transcript).await {
            warn!(error = %e, "could not cache transcript");
        }
        Ok(transcript)
    }

    pub async fn title(&self, video: &VideoRef) -> Result<String> {
        let url = video.url();
        self.metadata
            .title(video)
            .await
            .map_err(|e| AnimerefError::MetadataUnavailable {
                url: url.clone(),
                reason: e.to_string(),
            })?
            .filter(|title| !title.trim().is_empty())
            .ok_or_else(|| AnimerefError::MetadataUnavailable {
                url,
                reason: "no title found".to_string(),
            })
    }

    /// Video description, from the cache when allowed.
    pub async fn description(&self, video: &VideoRef) -> Result<String> {
        let cache_path =
            get_description_path(&get_video_cache_dir(&self.config.cache_dir, &video.id));

        if self.config.use_cache {
            if let Some(cached) = read_cached(&cache_path).await? {
                debug!(video = %video.id, "description cache hit");
                return Ok(cached);
            }
        }

        let url = video.url();
        let description = self
            .metadata
            .description(video)
            .await
            .map_err(|e| AnimerefError::MetadataUnavailable {
                url: url.clone(),
                reason: e.to_string(),
            })?
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| AnimerefError::MetadataUnavailable {
                url,
                reason: "no description found".to_string(),
            })?;

        if let Err(e) = write_cached(&cache_path, &description).await {
            warn!(error = %e, "could not cache description");
        }
        Ok(description)
    }

    /// Timestamp annotations from the video description.
    pub async fn timestamps(&self, video: &VideoRef) -> Result<TimestampMap> {
        let description = self.description(video).await?;
        Ok(extract_timestamps(&description))
    }

    /// Build the reference table for `video`, write it as CSV into the output
    /// directory and record the file in the registry.
    ///
    /// `output` is a file name; it defaults to `<title>_anime_references.csv`.
    pub async fn process_video(
        &self,
        video: &VideoRef,
        output: Option<&str>,
    ) -> Result<ExtractedTable> {
        info!(video = %video.id, "processing video");

        let transcript = self.transcript(video).await?;

        let title = match self.title(video).await {
            Ok(title) => {
                info!(%title, "video title");
                title
            }
            Err(e) => {
                warn!(error = %e, "could not retrieve video title, using video id instead");
                video.id.clone()
            }
        };

        let timestamps = match self.timestamps(video).await {
            Ok(timestamps) => timestamps,
            Err(e) => {
                warn!(error = %e, "could not retrieve description");
                TimestampMap::new()
            }
        };
        if timestamps.is_empty() {
            warn!(video = %video.id, "no timestamps found");
        }

        let Some(generator) = self.generator.as_deref() else {
            return Err(AnimerefError::GenerationFailed {
                reason: "no text generator configured".to_string(),
            });
        };
        let table = build_reference_table(
            &transcript,
            &timestamps,
            generator,
            self.config.generation_timeout,
        )
        .await?;
        if table.ragged_rows() > 0 {
            warn!(
                ragged = table.ragged_rows(),
                "some rows do not match the header width"
            );
        }

        let filename = output
            .map(String::from)
            .unwrap_or_else(|| format!("{}_anime_references.csv", sanitize_filename(&title)));

        fs::create_dir_all(&self.config.output_dir).await?;
        let csv_path = self.config.output_dir.join(&filename);
        fs::write(&csv_path, table.to_csv()?).await?;
        info!(path = %csv_path.display(), rows = table.rows.len(), "saved anime references");

        register_file(&self.config.registry_path, &filename).await?;

        Ok(ExtractedTable {
            title,
            csv_path,
            table,
            timestamps: timestamps.len(),
        })
    }

    /// Save the transcript as a text file, named after the video title unless
    /// `filename` is given.
    pub async fn save_transcript(
        &self,
        video: &VideoRef,
        filename: Option<&str>,
    ) -> Result<PathBuf> {
        let transcript = self.transcript(video).await?;

        let filename = match filename {
            Some(name) => with_txt_extension(name),
            None => match self.title(video).await {
                Ok(title) => format!("{}.txt", sanitize_filename(&title)),
                Err(e) => {
                    warn!(error = %e, "could not retrieve video title, using video id instead");
                    format!("{}.txt", video.id)
                }
            },
        };

        self.write_text(&filename, &transcript).await
    }

    /// Save the description as `<id>_description.txt` unless `filename` is given.
    pub async fn save_description(
        &self,
        video: &VideoRef,
        filename: Option<&str>,
    ) -> Result<PathBuf> {
        let description = self.description(video).await?;
        let filename = filename
            .map(with_txt_extension)
            .unwrap_or_else(|| format!("{}_description.txt", video.id));

        self.write_text(&filename, &description).await
    }

    async fn write_text(&self, filename: &str, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.config.output_dir).await?;
        let path = self.config.output_dir.join(filename);
        fs::write(&path, content).await?;
        info!(path = %path.display(), "saved text file");
        Ok(path)
    }
}

fn with_txt_extension(name: &str) -> String {
    if name.ends_with(".txt") {
        name.to_string()
    } else {
        format!("{name}.txt")
    }
}
