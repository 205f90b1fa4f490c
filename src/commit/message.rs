//! Commit message generation via the selected AI provider.

use std::fmt;

use tracing::{debug, error};

use crate::commit::prompt::SYSTEM_PROMPT;
use crate::error::CommitError;
use crate::llm::{ChatClient, is_connection_refused};

/// A non-empty, trimmed commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage(String);

impl CommitMessage {
    /// Trim `raw`; `None` if nothing is left.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ask the provider for a commit message describing `diff`.
///
/// Provider failures are classified: a refused connection anywhere in the
/// cause chain becomes [`CommitError::CannotConnect`], anything else
/// [`CommitError::GenerationFailed`]. A blank reply is
/// [`CommitError::EmptyResponse`].
pub async fn generate_commit_message<C>(client: &C, diff: &str) -> Result<CommitMessage, CommitError>
where
    C: ChatClient + ?Sized,
{
    debug!("Sending {} bytes of diff to provider", diff.len());

    let raw = match client.complete(SYSTEM_PROMPT, diff).await {
        Ok(raw) => raw,
        Err(err) => {
            error!("Failed to generate a commit message: {}", err);
            if is_connection_refused(&err) {
                return Err(CommitError::CannotConnect(err));
            }
            return Err(CommitError::GenerationFailed {
                message: err.to_string(),
                source: err,
            });
        }
    };

    CommitMessage::new(&raw).ok_or_else(|| {
        error!("Failed to generate a commit message: provider returned no text");
        CommitError::EmptyResponse
    })
}
