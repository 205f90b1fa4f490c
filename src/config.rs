//! Runtime configuration read from environment variables.
//!
//! Built once per invocation and passed down explicitly; nothing here is
//! global state.

use std::env;
use std::fmt;
use std::time::Duration;

use tracing::warn;

use crate::git::DEFAULT_TIMEOUT_SECS;

const DEFAULT_TEMPERATURE: f32 = 0.1;
const MAX_TEMPERATURE: f32 = 2.0;
const MAX_TIMEOUT_SECS: u64 = 3600;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-0";
pub const DEFAULT_GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GOOGLE_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Settings for a key-authenticated provider.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl ProviderConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

// Keep credentials out of debug logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Settings for a local Ollama server. Selecting a model is what enables it.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    pub model: Option<String>,
    pub base_url: String,
}

impl OllamaConfig {
    pub fn is_configured(&self) -> bool {
        self.model.as_deref().is_some_and(|m| !m.trim().is_empty())
    }
}

/// Everything a single run needs to talk to providers and git.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub openai: ProviderConfig,
    pub anthropic: ProviderConfig,
    pub google: ProviderConfig,
    pub deepseek: ProviderConfig,
    pub ollama: OllamaConfig,
    pub temperature: f32,
    pub command_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        Self {
            openai: ProviderConfig {
                api_key: get("OPENAI_API_KEY"),
                base_url: get_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
                model: get_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            },
            anthropic: ProviderConfig {
                api_key: get("ANTHROPIC_API_KEY"),
                base_url: get_or("ANTHROPIC_BASE_URL", DEFAULT_ANTHROPIC_BASE_URL),
                model: get_or("ANTHROPIC_MODEL", DEFAULT_ANTHROPIC_MODEL),
            },
            google: ProviderConfig {
                api_key: get("GOOGLE_API_KEY"),
                base_url: get_or("GOOGLE_BASE_URL", DEFAULT_GOOGLE_BASE_URL),
                model: get_or("GOOGLE_MODEL", DEFAULT_GOOGLE_MODEL),
            },
            deepseek: ProviderConfig {
                api_key: get("DEEPSEEK_API_KEY"),
                base_url: get_or("DEEPSEEK_BASE_URL", DEFAULT_DEEPSEEK_BASE_URL),
                model: get_or("DEEPSEEK_MODEL", DEFAULT_DEEPSEEK_MODEL),
            },
            ollama: OllamaConfig {
                model: get("OLLAMA_MODEL"),
                base_url: get_or("OLLAMA_BASE_URL", DEFAULT_OLLAMA_BASE_URL),
            },
            temperature: parse_temperature(get("AI_TEMPERATURE").as_deref()),
            command_timeout: parse_timeout(
                get("AI_COMMAND_TIMEOUT").or_else(|| get("AI_TIMEOUT")).as_deref(),
            ),
        }
    }
}

/// Parse a sampling temperature, falling back to the default outside `[0, 2]`.
fn parse_temperature(value: Option<&str>) -> f32 {
    let Some(raw) = value else {
        return DEFAULT_TEMPERATURE;
    };

    match raw.trim().parse::<f32>() {
        Ok(t) if (0.0..=MAX_TEMPERATURE).contains(&t) => t,
        _ => {
            warn!(
                "Invalid AI_TEMPERATURE value '{}', using default {}",
                raw, DEFAULT_TEMPERATURE
            );
            DEFAULT_TEMPERATURE
        }
    }
}

/// Parse the git command timeout in seconds; valid range is 1..3600.
fn parse_timeout(value: Option<&str>) -> Duration {
    let default = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
    let Some(raw) = value else {
        return default;
    };

    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 && secs < MAX_TIMEOUT_SECS => Duration::from_secs(secs),
        _ => {
            warn!(
                "Invalid command timeout '{}', using default {}s",
                raw, DEFAULT_TIMEOUT_SECS
            );
            default
        }
    }
}
