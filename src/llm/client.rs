//! The seam between commit generation and a concrete provider.

use std::error::Error;
use std::io;

use async_trait::async_trait;

use crate::error::ProviderError;

/// A single-turn chat completion.
///
/// Implementations return the raw response text. An empty string is a valid
/// answer here; callers decide whether that is an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError>;
}

/// Whether a refused connection appears anywhere in the error's cause chain.
///
/// Only an `io::Error` of kind `ConnectionRefused` counts. DNS failures and
/// connect timeouts are ordinary generation failures.
pub fn is_connection_refused(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>()
            && io_err.kind() == io::ErrorKind::ConnectionRefused
        {
            return true;
        }
        current = e.source();
    }
    false
}

/// A transport error from a request to a port nothing listens on.
#[cfg(test)]
pub(crate) async fn refused_transport_error() -> ProviderError {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let source = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/api/chat"))
        .send()
        .await
        .unwrap_err();
    ProviderError::Transport {
        provider: "Ollama",
        source,
    }
}
