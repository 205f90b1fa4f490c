//! Provider selection by fixed priority.

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ConfigError, ProviderError};

use super::anthropic::AnthropicClient;
use super::client::ChatClient;
use super::gemini::GeminiClient;
use super::http::build_http_client;
use super::ollama::OllamaClient;
use super::openai::OpenAiClient;

/// Supported AI providers, in selection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
    DeepSeek,
    Ollama,
}

impl Provider {
    pub const PRIORITY: [Provider; 5] = [
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Google,
        Provider::DeepSeek,
        Provider::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::Google => "Google Gemini",
            Provider::DeepSeek => "DeepSeek",
            Provider::Ollama => "Ollama",
        }
    }

    fn is_configured(&self, config: &Config) -> bool {
        match self {
            Provider::OpenAi => config.openai.is_configured(),
            Provider::Anthropic => config.anthropic.is_configured(),
            Provider::Google => config.google.is_configured(),
            Provider::DeepSeek => config.deepseek.is_configured(),
            Provider::Ollama => config.ollama.is_configured(),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The first configured provider, if any.
pub fn configured_provider(config: &Config) -> Option<Provider> {
    Provider::PRIORITY
        .into_iter()
        .find(|p| p.is_configured(config))
}

/// A ready-to-use client for whichever provider was selected.
#[derive(Debug, Clone)]
pub enum ProviderClient {
    OpenAi(OpenAiClient),
    Anthropic(AnthropicClient),
    Google(GeminiClient),
    DeepSeek(OpenAiClient),
    Ollama(OllamaClient),
}

impl ProviderClient {
    pub fn provider(&self) -> Provider {
        match self {
            ProviderClient::OpenAi(_) => Provider::OpenAi,
            ProviderClient::Anthropic(_) => Provider::Anthropic,
            ProviderClient::Google(_) => Provider::Google,
            ProviderClient::DeepSeek(_) => Provider::DeepSeek,
            ProviderClient::Ollama(_) => Provider::Ollama,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            ProviderClient::OpenAi(c) | ProviderClient::DeepSeek(c) => c.endpoint(),
            ProviderClient::Anthropic(c) => c.endpoint(),
            ProviderClient::Google(c) => c.endpoint(),
            ProviderClient::Ollama(c) => c.endpoint(),
        }
    }
}

#[async_trait]
impl ChatClient for ProviderClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        match self {
            ProviderClient::OpenAi(c) | ProviderClient::DeepSeek(c) => {
                c.complete(system, user).await
            }
            ProviderClient::Anthropic(c) => c.complete(system, user).await,
            ProviderClient::Google(c) => c.complete(system, user).await,
            ProviderClient::Ollama(c) => c.complete(system, user).await,
        }
    }
}

/// Build a client for the highest-priority configured provider.
pub fn select_provider(config: &Config) -> Result<ProviderClient, ConfigError> {
    let provider = configured_provider(config).ok_or(ConfigError::NoProviderConfigured)?;
    let http = build_http_client()?;
    let temperature = config.temperature;

    let (client, model) = match provider {
        Provider::OpenAi => (
            ProviderClient::OpenAi(OpenAiClient::openai(http, &config.openai, temperature)),
            config.openai.model.as_str(),
        ),
        Provider::Anthropic => (
            ProviderClient::Anthropic(AnthropicClient::new(http, &config.anthropic, temperature)),
            config.anthropic.model.as_str(),
        ),
        Provider::Google => (
            ProviderClient::Google(GeminiClient::new(http, &config.google, temperature)),
            config.google.model.as_str(),
        ),
        Provider::DeepSeek => (
            ProviderClient::DeepSeek(OpenAiClient::deepseek(http, &config.deepseek, temperature)),
            config.deepseek.model.as_str(),
        ),
        Provider::Ollama => (
            ProviderClient::Ollama(OllamaClient::new(http, &config.ollama, temperature)),
            config.ollama.model.as_deref().unwrap_or_default(),
        ),
    };

    info!("Using AI provider: {}", provider);
    debug!("Endpoint: {}, model: {}", client.endpoint(), model);

    Ok(client)
}
