//! ai-commit - writes Conventional Commits messages for staged changes.
//!
//! # Overview
//!
//! ai-commit reads the staged diff through the system `git`, asks the first
//! configured AI provider for a commit message, lets the user accept,
//! regenerate, edit or cancel it, then commits and optionally pushes.

pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod preferences;

// Re-export commonly used types
pub use commit::{CommitMessage, CommitOutcome, CommitWorkflow, PushStatus, WorkflowChoice};
pub use config::Config;
pub use error::{CommitError, ConfigError, PreferencesError, ProcessError, ProviderError};
pub use git::{GitGateway, GitOperations, ProcessRunner};
pub use llm::{ChatClient, Provider, ProviderClient, select_provider};
pub use preferences::{
    ConfigAction, FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, Preferences,
};
