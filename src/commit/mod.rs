//! AI-generated commit messages and the review/commit workflow.

pub mod message;
pub mod prompt;
pub mod workflow;

pub use message::{CommitMessage, generate_commit_message};
pub use prompt::SYSTEM_PROMPT;
pub use workflow::{CommitOutcome, CommitWorkflow, PushStatus, WorkflowChoice};
