//! Chat completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::upstream::types::{ChatMessage, UpstreamError, UpstreamResult};

/// Anything that turns a conversation into model text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> UpstreamResult<String>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible client (OpenRouter by default).
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    referer: String,
    title: String,
}

impl OpenRouterClient {
    /// Build a client. `referer` is sent as `HTTP-Referer` for attribution.
    pub fn new(config: &UpstreamConfig, referer: &str, timeout: Duration) -> UpstreamResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            referer: referer.to_string(),
            title: config.title.clone(),
        })
    }
}

#[async_trait]
impl ModelClient for OpenRouterClient {
    async fn complete(&self, messages: &[ChatMessage]) -> UpstreamResult<String> {
        let api_key = self.api_key.as_deref().ok_or(UpstreamError::NotConfigured)?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&CompletionRequest {
                model: &self.model,
                messages,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body: CompletionResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(UpstreamError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let config = UpstreamConfig {
            base_url: "http://127.0.0.1:1".into(),
            ..UpstreamConfig::default()
        };
        let client = OpenRouterClient::new(&config, "https://example.com", Duration::from_secs(1)).unwrap();
        let err = client.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, UpstreamError::NotConfigured));
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let config = UpstreamConfig {
            base_url: "https://api.example.com/v1/".into(),
            ..UpstreamConfig::default()
        };
        let client = OpenRouterClient::new(&config, "https://example.com", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint, "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn test_request_shape() {
        let messages = [ChatMessage::user("hi")];
        let json = serde_json::to_value(CompletionRequest {
            model: "m",
            messages: &messages,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]})
        );
    }
}
