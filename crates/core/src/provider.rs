use serde_json::Value;

use crate::error::{AnimerefError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

/// Request/response shape spoken by a provider's streaming endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiStyle {
    /// `models/<model>:streamGenerateContent?alt=sse`
    GeminiNative,
    /// `chat/completions` with `"stream": true`
    ChatCompletions,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
    pub style: ApiStyle,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/models",
                model: "gemini-2.5-pro",
                env_var: "GEMINI_API_KEY",
                style: ApiStyle::GeminiNative,
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-5.1",
                env_var: "OPENAI_API_KEY",
                style: ApiStyle::ChatCompletions,
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
                style: ApiStyle::ChatCompletions,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Openai => "OpenAI",
            Provider::Grok => "Grok",
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String> {
        self.api_key_from(|env_var| std::env::var(env_var).ok())
    }

    /// Resolve the API key through `lookup`, keyed by the provider's env var.
    /// Blank keys count as missing.
    pub fn api_key_from(&self, lookup: impl FnOnce(&str) -> Option<String>) -> Result<String> {
        let env_var = self.config().env_var;
        lookup(env_var)
            .filter(|key| !key.trim().is_empty())
            .ok_or(AnimerefError::MissingApiKey { env_var })
    }

    /// Streaming endpoint for `model`.
    pub fn stream_url(&self, model: &str) -> String {
        let config = self.config();
        match config.style {
            ApiStyle::GeminiNative => {
                format!("{}/{}:streamGenerateContent?alt=sse", config.api_url, model)
            }
            ApiStyle::ChatCompletions => config.api_url.to_string(),
        }
    }

    /// JSON body asking `model` to stream a completion of `prompt`.
    pub fn request_body(&self, model: &str, prompt: &str) -> Value {
        match self.config().style {
            ApiStyle::GeminiNative => serde_json::json!({
                "contents": [
                    {
                        "role": "user",
                        "parts": [{ "text": prompt }],
                    },
                ],
                "generationConfig": {
                    "responseMimeType": "text/plain",
                },
            }),
            ApiStyle::ChatCompletions => serde_json::json!({
                "model": model,
                "messages": [
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
                "stream": true,
            }),
        }
    }

    /// Text carried by one streamed event payload, if any.
    ///
    /// An `error` object in the payload is reported as a generation failure.
    pub fn fragment(&self, payload: &Value) -> Result<Option<String>> {
        if let Some(error) = payload.get("error") {
            return Err(AnimerefError::GenerationFailed {
                reason: format!("{} returned an error: {}", self.name(), error),
            });
        }

        let text = match self.config().style {
            ApiStyle::GeminiNative => payload["candidates"][0]["content"]["parts"]
                .as_array()
                .map(|parts| {
                    parts
                        .iter()
                        .filter_map(|part| part["text"].as_str())
                        .collect::<String>()
                }),
            ApiStyle::ChatCompletions => payload["choices"][0]["delta"]["content"]
                .as_str()
                .map(String::from),
        };

        Ok(text.filter(|t| !t.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_stream_url_embeds_model() {
        assert_eq!(
            Provider::Gemini.stream_url("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
        assert_eq!(
            Provider::Grok.stream_url("grok-4-fast"),
            "https://api.x.ai/v1/chat/completions"
        );
    }

    #[test]
    fn gemini_fragment_joins_parts() {
        let payload = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "| A "}, {"text": "| B |"}]}}]
        });
        assert_eq!(
            Provider::Gemini.fragment(&payload).unwrap().as_deref(),
            Some("| A | B |")
        );
    }

    #[test]
    fn chat_fragment_reads_delta() {
        let payload = serde_json::json!({"choices": [{"delta": {"content": "| 1 |"}}]});
        assert_eq!(
            Provider::Openai.fragment(&payload).unwrap().as_deref(),
            Some("| 1 |")
        );

        let role_only = serde_json::json!({"choices": [{"delta": {"role": "assistant"}}]});
        assert_eq!(Provider::Grok.fragment(&role_only).unwrap(), None);
    }

    #[test]
    fn error_payload_is_generation_failure() {
        let payload = serde_json::json!({"error": {"code": 429, "message": "quota"}});
        assert!(matches!(
            Provider::Gemini.fragment(&payload),
            Err(AnimerefError::GenerationFailed { .. })
        ));
    }

    #[test]
    fn api_key_lookup_uses_provider_env_var() {
        let key = Provider::Grok.api_key_from(|var| (var == "XAI_API_KEY").then(|| "xai-123".into()));
        assert_eq!(key.unwrap(), "xai-123");

        assert!(matches!(
            Provider::Openai.api_key_from(|_| None),
            Err(AnimerefError::MissingApiKey { env_var: "OPENAI_API_KEY" })
        ));
        assert!(matches!(
            Provider::Gemini.api_key_from(|_| Some("  ".into())),
            Err(AnimerefError::MissingApiKey { env_var: "GEMINI_API_KEY" })
        ));
    }

    #[test]
    fn chat_body_requests_streaming() {
        let body = Provider::Openai.request_body("gpt-5.1", "hi");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["content"], "hi");
    }
}
