use std::{collections::VecDeque, io, time::Duration};

use async_trait::async_trait;
use futures_util::{
    Stream, StreamExt, TryStreamExt,
    stream::{self, BoxStream},
};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio_util::{bytes::Buf, io::StreamReader};
use tracing::debug;

use crate::{
    error::{AnimerefError, Result},
    provider::{ApiStyle, Provider},
    sse::SseEvents,
};

/// Ordered fragments of one generated response.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Anything that turns a prompt into streamed text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<FragmentStream>;
}

/// Streams completions from a hosted provider over HTTP.
pub struct HttpGenerator {
    client: reqwest::Client,
    provider: Provider,
    model: String,
    api_key: String,
}

impl HttpGenerator {
    /// Fails early when the provider's API key is not set.
    pub fn new(provider: Provider, model: Option<String>) -> Result<Self> {
        let api_key = provider.validate_api_key()?;
        Ok(Self::with_api_key(provider, model, api_key))
    }

    pub fn with_api_key(provider: Provider, model: Option<String>, api_key: String) -> Self {
        let model = model.unwrap_or_else(|| provider.config().model.to_string());
        Self {
            client: reqwest::Client::new(),
            provider,
            model,
            api_key,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<FragmentStream> {
        let url = self.provider.stream_url(&self.model);
        debug!(provider = self.provider.name(), model = %self.model, "requesting completion");

        let request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(&self.provider.request_body(&self.model, prompt));
        let request = match self.provider.config().style {
            ApiStyle::GeminiNative => request.header("x-goog-api-key", &self.api_key),
            ApiStyle::ChatCompletions => {
                request.header("Authorization", format!("Bearer {}", self.api_key))
            }
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnimerefError::GenerationFailed {
                reason: format!("{} responded with {}: {}", self.provider.name(), status, body),
            });
        }

        let body = response.bytes_stream().map_err(io::Error::other);
        Ok(fragment_stream(body, self.provider))
    }
}

/// Decode a streamed `text/event-stream` body into `provider` text fragments.
///
/// The stream ends at `[DONE]` or at the end of the body.
pub fn fragment_stream<S, B>(body: S, provider: Provider) -> FragmentStream
where
    S: Stream<Item = io::Result<B>> + Send + 'static,
    B: Buf + Send + 'static,
{
    let state = StreamState {
        lines: StreamReader::new(body.boxed()).lines(),
        events: SseEvents::new(),
        pending: VecDeque::new(),
        provider,
        finished: false,
    };

    stream::try_unfold(state, next_fragment).boxed()
}

struct StreamState<R> {
    lines: Lines<R>,
    events: SseEvents,
    pending: VecDeque<String>,
    provider: Provider,
    finished: bool,
}

async fn next_fragment<R>(mut state: StreamState<R>) -> Result<Option<(String, StreamState<R>)>>
where
    R: AsyncBufRead + Unpin + Send,
{
    loop {
        if let Some(fragment) = state.pending.pop_front() {
            return Ok(Some((fragment, state)));
        }
        if state.finished {
            return Ok(None);
        }

        let event = match state.lines.next_line().await? {
            Some(line) => state.events.line(&line),
            None => {
                state.finished = true;
                state.events.finish()
            }
        };
        let Some(data) = event else {
            continue;
        };

        if data == "[DONE]" {
            state.finished = true;
            continue;
        }
        let payload: Value = serde_json::from_str(&data)?;
        if let Some(text) = state.provider.fragment(&payload)? {
            state.pending.push_back(text);
        }
    }
}

/// Run `generator` on `prompt` and concatenate its fragments in arrival order.
///
/// Every failure comes back as a generation error; a blank response is one too.
pub async fn collect_response<G>(
    generator: &G,
    prompt: &str,
    timeout: Duration,
    mut on_fragment: impl FnMut(&str) + Send,
) -> Result<String>
where
    G: TextGenerator + ?Sized,
{
    let collect = async {
        let mut fragments = generator.generate(prompt).await?;
        let mut response = String::new();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            on_fragment(&fragment);
            response.push_str(&fragment);
        }
        Ok::<_, AnimerefError>(response)
    };

    let response = match tokio::time::timeout(timeout, collect).await {
        Err(_) => return Err(AnimerefError::GenerationTimeout(timeout)),
        Ok(Err(e)) if e.is_generation() => return Err(e),
        Ok(Err(e)) => {
            return Err(AnimerefError::GenerationFailed {
                reason: e.to_string(),
            });
        }
        Ok(Ok(response)) => response,
    };

    if response.trim().is_empty() {
        return Err(AnimerefError::GenerationFailed {
            reason: "the model returned no content".to_string(),
        });
    }
    Ok(response)
}
