use super::prompts::{system_prompt, user_prompt};
use super::{NarrativeGenerator, NarrativeRequest};
use crate::{SummaryError, SummaryResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteSettings {
    /// Full URL of the chat-completions endpoint.
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Narrative generator backed by a hosted language model.
///
/// Requests use temperature 0 and a seed derived from the request content. Dropping the
/// returned future aborts the HTTP call.
#[derive(Clone, Debug)]
pub struct RemoteGenerator {
    client: Client,
    settings: RemoteSettings,
    id: String,
}

impl RemoteGenerator {
    pub fn new(settings: RemoteSettings) -> SummaryResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| SummaryError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            id: format!("remote:{}", settings.model),
            client,
            settings,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    seed: u64,
    messages: [ChatMessage; 2],
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatAnswer,
}

#[derive(Deserialize)]
struct ChatAnswer {
    #[serde(default)]
    content: Option<String>,
}

fn unavailable(context: &str, detail: impl std::fmt::Display) -> SummaryError {
    SummaryError::GenerationUnavailable(format!("{context}: {detail}"))
}

#[async_trait]
impl NarrativeGenerator for RemoteGenerator {
    fn id(&self) -> &str {
        &self.id
    }

    async fn overview(&self, request: &NarrativeRequest) -> SummaryResult<String> {
        let body = ChatRequest {
            model: &self.settings.model,
            temperature: 0.0,
            seed: request.seed & (i64::MAX as u64),
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt(request.audience, request.length),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(request)?,
                },
            ],
        };

        tracing::debug!(url = %self.settings.url, model = %self.settings.model, "Requesting overview narrative");

        let mut call = self.client.post(&self.settings.url).json(&body);
        if let Some(key) = &self.settings.api_key {
            call = call.bearer_auth(key);
        }
        let response = call
            .send()
            .await
            .map_err(|e| unavailable("narrative request failed", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Narrative backend returned an error status");
            return Err(unavailable("narrative backend returned", format!("{status}: {text}")));
        }

        let answer: ChatResponse = response
            .json()
            .await
            .map_err(|e| unavailable("failed to parse narrative response", e))?;

        answer
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                SummaryError::GenerationUnavailable("narrative backend returned no text".into())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> RemoteSettings {
        RemoteSettings {
            url: url.into(),
            model: "gpt-4o-mini".into(),
            api_key: Some("test-key".into()),
            timeout: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_id_names_the_model() {
        let generator = RemoteGenerator::new(settings("http://127.0.0.1:9/v1/chat/completions"))
            .expect("client");
        assert_eq!(generator.id(), "remote:gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_generation_unavailable() {
        let generator = RemoteGenerator::new(settings("http://127.0.0.1:9/v1/chat/completions"))
            .expect("client");
        let err = generator
            .overview(&NarrativeRequest::default())
            .await
            .expect_err("nothing listens on the discard port");
        assert!(matches!(err, SummaryError::GenerationUnavailable(_)));
    }

    #[test]
    fn test_response_without_content_parses() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).expect("json");
        assert!(parsed.choices[0].message.content.is_none());
    }
}
