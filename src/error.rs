//! Error types for ai-commit modules using thiserror.

use thiserror::Error;

/// Errors from running an external command.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Timeout while waiting for process ('{command}') to finish after {seconds} seconds")]
    Timeout { command: String, seconds: u64 },

    #[error("Command ('{command}') failed with exit code: {code}\n {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Executable '{program}' was not found on PATH")]
    NotFound { program: String },

    #[error("Failed to execute command: {command}. {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command ('{command}') could not be awaited: {source}")]
    WaitFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from a single AI provider request.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API returned {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned a response that could not be decoded: {source}")]
    Decode {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Errors from loading configuration or selecting a provider.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "No AI provider configured. Please set one of the following:\n\n\
         1. OpenAI / OpenAI-compatible:\n   \
            export OPENAI_API_KEY=\"your-api-key\"\n   \
            export OPENAI_MODEL=\"gpt-4o\"  # optional\n   \
            export OPENAI_BASE_URL=\"https://api.openai.com\"  # optional\n\n\
         2. Anthropic Claude:\n   \
            export ANTHROPIC_API_KEY=\"your-api-key\"\n   \
            export ANTHROPIC_MODEL=\"claude-sonnet-4-0\"  # optional\n\n\
         3. Google Gemini:\n   \
            export GOOGLE_API_KEY=\"your-api-key\"\n   \
            export GOOGLE_MODEL=\"gemini-2.0-flash\"  # optional\n\n\
         4. DeepSeek:\n   \
            export DEEPSEEK_API_KEY=\"your-api-key\"\n\n\
         5. Ollama (local):\n   \
            export OLLAMA_MODEL=\"llama3\"\n   \
            export OLLAMA_BASE_URL=\"http://localhost:11434\"  # optional\n\n\
         Run 'ai-commit --help' for more information."
    )]
    NoProviderConfigured,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Errors from the persistent preference store.
#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("Could not determine a configuration directory for preferences")]
    NoConfigDir,

    #[error("Failed to write preferences: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Failed to serialize preferences: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    #[error("Failed to write to terminal: {0}")]
    Output(#[source] std::io::Error),
}

/// Errors from the generate-and-commit workflow.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No staged changes found! Use 'git add' to stage changes first.")]
    NoStagedChanges,

    #[error("AI returned an empty commit message")]
    EmptyResponse,

    #[error(
        "Cannot connect to AI provider. Check your internet connection and verify the provider is accessible."
    )]
    CannotConnect(#[source] ProviderError),

    #[error("Failed to generate a commit message: {message}")]
    GenerationFailed {
        message: String,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Git(#[from] ProcessError),

    #[error("Failed to write to terminal: {0}")]
    Output(#[source] std::io::Error),
}
