//! OpenAI chat completions, also spoken by DeepSeek and most compatible gateways.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::ProviderError;

use super::client::ChatClient;
use super::http::{join_url, send_json};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any `/chat/completions` endpoint with bearer auth.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    provider: &'static str,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    /// OpenAI or an OpenAI-compatible API. A base URL that already ends in
    /// `/v1` is used as is.
    pub fn openai(http: Client, config: &ProviderConfig, temperature: f32) -> Self {
        Self::with_endpoint(
            http,
            "OpenAI",
            openai_endpoint(&config.base_url),
            config,
            temperature,
        )
    }

    /// DeepSeek serves the same protocol without the `/v1` prefix.
    pub fn deepseek(http: Client, config: &ProviderConfig, temperature: f32) -> Self {
        Self::with_endpoint(
            http,
            "DeepSeek",
            join_url(&config.base_url, "chat/completions"),
            config,
            temperature,
        )
    }

    fn with_endpoint(
        http: Client,
        provider: &'static str,
        endpoint: String,
        config: &ProviderConfig,
        temperature: f32,
    ) -> Self {
        Self {
            http,
            provider,
            endpoint,
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            temperature,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn openai_endpoint(base_url: &str) -> String {
    if base_url.trim_end_matches('/').ends_with("/v1") {
        join_url(base_url, "chat/completions")
    } else {
        join_url(base_url, "v1/chat/completions")
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let payload = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };

        let request = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload);
        let response: ChatResponse = send_json(self.provider, request).await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}
