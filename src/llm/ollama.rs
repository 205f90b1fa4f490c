//! Local Ollama server via `/api/chat`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::OllamaConfig;
use crate::error::ProviderError;

use super::client::ChatClient;
use super::http::{join_url, send_json};

const PROVIDER: &str = "Ollama";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: Options,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OllamaClient {
    pub fn new(http: Client, config: &OllamaConfig, temperature: f32) -> Self {
        Self {
            http,
            endpoint: join_url(&config.base_url, "api/chat"),
            model: config.model.clone().unwrap_or_default(),
            temperature,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
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
            stream: false,
            options: Options {
                temperature: self.temperature,
            },
        };

        let request = self.http.post(&self.endpoint).json(&payload);
        let response: ChatResponse = send_json(PROVIDER, request).await?;

        Ok(response.message.map(|m| m.content).unwrap_or_default())
    }
}
