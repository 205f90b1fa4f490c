//! Chat-completion clients for the supported AI providers.

pub mod anthropic;
pub mod client;
pub mod gemini;
pub mod http;
pub mod ollama;
pub mod openai;
pub mod router;

pub use client::{ChatClient, is_connection_refused};
pub use router::{Provider, ProviderClient, select_provider};
