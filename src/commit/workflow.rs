//! Generate, review and commit in one pass.
//!
//! The interactive path is a small state machine over [`ReviewState`]. Each
//! user choice is exactly one transition, and the loop ends only by
//! committing, cancelling or failing.

use std::io::{BufRead, Write};

use tracing::{debug, error, info, warn};

use crate::commit::message::{CommitMessage, generate_commit_message};
use crate::error::CommitError;
use crate::git::GitOperations;
use crate::llm::ChatClient;
use crate::preferences::Preferences;

const RULE_WIDTH: usize = 60;

/// What the user decided to do with a proposed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowChoice {
    Accept,
    Regenerate,
    Edit,
    Cancel,
}

impl WorkflowChoice {
    /// Parse a line of user input. Blank input means accept; anything
    /// unrecognized is `None`.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "" | "y" | "yes" => Some(WorkflowChoice::Accept),
            "r" | "regenerate" => Some(WorkflowChoice::Regenerate),
            "e" | "edit" => Some(WorkflowChoice::Edit),
            "c" | "cancel" => Some(WorkflowChoice::Cancel),
            _ => None,
        }
    }
}

/// Result of the push attempted after a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStatus {
    /// Auto-push is off.
    Skipped,
    Pushed,
    /// The commit stands; the push error is kept for reporting.
    Failed(String),
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed {
        message: CommitMessage,
        push: PushStatus,
    },
    Cancelled,
}

#[derive(Debug)]
enum ReviewState {
    Generating,
    Reviewing(CommitMessage),
    Committing(CommitMessage),
}

/// Drives one generate-and-commit run against a repository and a provider.
///
/// User-facing text goes to `output`, answers are read from `input`.
pub struct CommitWorkflow<G, C, R, W> {
    git: G,
    client: C,
    preferences: Preferences,
    input: R,
    output: W,
}

impl<G, C, R, W> CommitWorkflow<G, C, R, W>
where
    G: GitOperations,
    C: ChatClient,
    R: BufRead,
    W: Write,
{
    pub fn new(git: G, client: C, preferences: Preferences, input: R, output: W) -> Self {
        Self {
            git,
            client,
            preferences,
            input,
            output,
        }
    }

    /// Run the workflow once.
    ///
    /// Makes at most one commit and, when auto-push is on, at most one push
    /// right after it. A failed push is reported and returned as
    /// [`PushStatus::Failed`]; the commit is kept.
    pub async fn generate_and_commit(&mut self) -> Result<CommitOutcome, CommitError> {
        info!("Checking for staged changes");
        if !self.git.has_staged_changes().await {
            return Err(CommitError::NoStagedChanges);
        }

        let diff = self.git.staged_diff().await?;

        if self.preferences.auto_commit {
            self.auto_commit(&diff).await
        } else {
            self.review(&diff).await
        }
    }

    async fn auto_commit(&mut self, diff: &str) -> Result<CommitOutcome, CommitError> {
        info!("Auto-commit is enabled, generating commit message");

        let message = match generate_commit_message(&self.client, diff).await {
            Ok(message) => message,
            Err(err) => {
                self.say("Auto-commit aborted. No changes were committed.")?;
                error!("Auto-commit failed: {}", err);
                return Err(err);
            }
        };

        self.show_message(&message)?;
        self.say("\nAuto-committing...")?;
        self.commit_and_push(message).await
    }

    async fn review(&mut self, diff: &str) -> Result<CommitOutcome, CommitError> {
        let mut state = ReviewState::Generating;

        loop {
            state = match state {
                ReviewState::Generating => {
                    info!("Generating commit message");
                    ReviewState::Reviewing(generate_commit_message(&self.client, diff).await?)
                }
                ReviewState::Reviewing(message) => {
                    self.show_message(&message)?;
                    match self.prompt_choice()? {
                        WorkflowChoice::Accept => ReviewState::Committing(message),
                        WorkflowChoice::Regenerate => {
                            self.say("\nRegenerating commit message...")?;
                            ReviewState::Generating
                        }
                        WorkflowChoice::Edit => ReviewState::Committing(self.edit_message(message)?),
                        WorkflowChoice::Cancel => {
                            self.say("\nCancelling commit...")?;
                            info!("Commit cancelled by user");
                            return Ok(CommitOutcome::Cancelled);
                        }
                    }
                }
                ReviewState::Committing(message) => return self.commit_and_push(message).await,
            };
        }
    }

    /// Ask until the answer is recognized. EOF or a read error accepts.
    fn prompt_choice(&mut self) -> Result<WorkflowChoice, CommitError> {
        loop {
            self.say("\nCommit with this message? (y)es / (r)egenerate / (e)dit / (c)ancel [y]: ")?;

            match self.read_line() {
                Some(line) => match WorkflowChoice::parse(&line) {
                    Some(choice) => return Ok(choice),
                    None => self.say("Invalid choice. Please try again.")?,
                },
                None => return Ok(WorkflowChoice::Accept),
            }
        }
    }

    /// Offer a replacement for `original`. Blank input keeps it.
    fn edit_message(&mut self, original: CommitMessage) -> Result<CommitMessage, CommitError> {
        let rule = "=".repeat(RULE_WIDTH);
        self.say(&format!("\n{rule}\nCurrent message:\n{original}\n{rule}\n"))?;
        self.say("Enter new commit message or press Enter to keep current one:\n> ")?;

        let edited = self.read_line().and_then(|line| CommitMessage::new(&line));
        match edited {
            Some(message) => {
                info!("Using edited commit message");
                Ok(message)
            }
            None => {
                self.say("Empty message. Using original commit message.")?;
                Ok(original)
            }
        }
    }

    async fn commit_and_push(
        &mut self,
        message: CommitMessage,
    ) -> Result<CommitOutcome, CommitError> {
        info!("Committing changes");
        let output = self.git.commit(message.as_str()).await?;
        info!("Committed changes successfully");

        // The commit exists from here on; terminal failures no longer end the run.
        self.report(&git_output_block(&output));
        let push = self.push_if_enabled().await;
        Ok(CommitOutcome::Committed { message, push })
    }

    async fn push_if_enabled(&mut self) -> PushStatus {
        if !self.preferences.auto_push {
            debug!("Auto-push is disabled");
            return PushStatus::Skipped;
        }

        self.report("\nAuto-pushing...");
        match self.git.push().await {
            Ok(output) => {
                self.report(&git_output_block(&output));
                info!("Pushed changes successfully");
                PushStatus::Pushed
            }
            Err(err) => {
                self.report(&format!(
                    "\nFailed to push: {err}\nCommit was successful, but push failed."
                ));
                warn!("Push failed: {}", err);
                PushStatus::Failed(err.to_string())
            }
        }
    }

    fn show_message(&mut self, message: &CommitMessage) -> Result<(), CommitError> {
        let rule = "-".repeat(RULE_WIDTH);
        self.say(&format!("\nAI generated commit message:\n{rule}\n{message}\n{rule}"))
    }

    /// One line of input, or `None` on EOF or a read error.
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                warn!("Failed to read user input: {}", e);
                None
            }
        }
    }

    fn say(&mut self, text: &str) -> Result<(), CommitError> {
        writeln!(self.output, "{text}")
            .and_then(|_| self.output.flush())
            .map_err(CommitError::Output)
    }

    /// Like [`say`](Self::say), but a write failure is only logged.
    fn report(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Err(e) = self.say(text) {
            warn!("Could not write to terminal: {}", e);
        }
    }
}

/// Git's output set off by a blank line, or nothing when git was silent.
fn git_output_block(output: &str) -> String {
    if output.trim().is_empty() {
        String::new()
    } else {
        format!("\n{}", output.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProcessError, ProviderError};
    use crate::git::gateway::MockGitOperations;
    use crate::llm::client::{MockChatClient, refused_transport_error};
    use mockall::Sequence;
    use std::io;

    /// Terminal that breaks once `marker` has been written to it.
    struct BrokenTerminal {
        marker: &'static str,
        written: String,
    }

    impl BrokenTerminal {
        fn breaking_at(marker: &'static str) -> Self {
            Self {
                marker,
                written: String::new(),
            }
        }
    }

    impl Write for BrokenTerminal {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written.contains(self.marker) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal closed"));
            }
            self.written.push_str(&String::from_utf8_lossy(buf));
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.written.contains(self.marker) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal closed"));
            }
            Ok(())
        }
    }

    fn prefs(auto_commit: bool, auto_push: bool) -> Preferences {
        Preferences {
            auto_commit,
            auto_push,
        }
    }

    fn staged_repo() -> MockGitOperations {
        let mut git = MockGitOperations::new();
        git.expect_has_staged_changes().returning(|| true);
        git.expect_staged_diff()
            .times(1)
            .returning(|| Ok("diff --git a/src/lib.rs b/src/lib.rs".to_string()));
        git
    }

    fn replying(replies: &[&str]) -> MockChatClient {
        let mut client = MockChatClient::new();
        let mut seq = Sequence::new();
        for reply in replies {
            let reply = reply.to_string();
            client
                .expect_complete()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_, _| Ok(reply.clone()));
        }
        client
    }

    async fn run(
        git: MockGitOperations,
        client: MockChatClient,
        preferences: Preferences,
        input: &str,
    ) -> (Result<CommitOutcome, CommitError>, String) {
        run_bytes(git, client, preferences, input.as_bytes()).await
    }

    async fn run_bytes(
        git: MockGitOperations,
        client: MockChatClient,
        preferences: Preferences,
        input: &[u8],
    ) -> (Result<CommitOutcome, CommitError>, String) {
        let mut output = Vec::new();
        let result = {
            let mut workflow = CommitWorkflow::new(git, client, preferences, input, &mut output);
            workflow.generate_and_commit().await
        };
        (result, String::from_utf8(output).unwrap())
    }

    fn committed(message: &str, push: PushStatus) -> CommitOutcome {
        CommitOutcome::Committed {
            message: CommitMessage::new(message).unwrap(),
            push,
        }
    }

    #[test]
    fn test_choice_parsing() {
        assert_eq!(WorkflowChoice::parse("y"), Some(WorkflowChoice::Accept));
        assert_eq!(WorkflowChoice::parse("YES\n"), Some(WorkflowChoice::Accept));
        assert_eq!(WorkflowChoice::parse("   "), Some(WorkflowChoice::Accept));
        assert_eq!(WorkflowChoice::parse("R"), Some(WorkflowChoice::Regenerate));
        assert_eq!(WorkflowChoice::parse("edit"), Some(WorkflowChoice::Edit));
        assert_eq!(WorkflowChoice::parse(" c "), Some(WorkflowChoice::Cancel));
        assert_eq!(WorkflowChoice::parse("x"), None);
        assert_eq!(WorkflowChoice::parse("no"), None);
    }

    #[tokio::test]
    async fn test_no_staged_changes_fails_without_side_effects() {
        let mut git = MockGitOperations::new();
        git.expect_has_staged_changes().times(1).returning(|| false);
        git.expect_staged_diff().never();
        git.expect_commit().never();
        git.expect_push().never();
        let mut client = MockChatClient::new();
        client.expect_complete().never();

        let (result, _) = run(git, client, prefs(false, true), "y\n").await;

        let err = result.unwrap_err();
        assert!(matches!(err, CommitError::NoStagedChanges));
        assert_eq!(
            err.to_string(),
            "No staged changes found! Use 'git add' to stage changes first."
        );
    }

    #[tokio::test]
    async fn test_accept_commits_generated_message_without_push() {
        let mut git = staged_repo();
        git.expect_commit()
            .withf(|m| m == "feat: add login")
            .times(1)
            .returning(|_| Ok("[main abc123] feat: add login".to_string()));
        git.expect_push().never();

        let (result, output) = run(git, replying(&["feat: add login"]), prefs(false, false), "y\n").await;

        assert_eq!(result.unwrap(), committed("feat: add login", PushStatus::Skipped));
        assert!(output.contains("AI generated commit message:"));
        assert!(output.contains("[main abc123] feat: add login"));
    }

    #[tokio::test]
    async fn test_regenerate_commits_second_message() {
        let mut git = staged_repo();
        git.expect_commit()
            .withf(|m| m == "fix: second")
            .times(1)
            .returning(|_| Ok(String::new()));
        git.expect_push().never();

        let client = replying(&["feat: first", "fix: second"]);
        let (result, output) = run(git, client, prefs(false, false), "r\ny\n").await;

        assert_eq!(result.unwrap(), committed("fix: second", PushStatus::Skipped));
        assert!(output.contains("Regenerating commit message..."));
    }

    #[tokio::test]
    async fn test_generation_count_tracks_regenerations() {
        let mut git = staged_repo();
        git.expect_commit().times(1).returning(|_| Ok(String::new()));

        let client = replying(&["a: 1", "a: 2", "a: 3", "a: 4"]);
        let (result, _) = run(git, client, prefs(false, false), "r\nR\nregenerate\n\n").await;

        assert_eq!(result.unwrap(), committed("a: 4", PushStatus::Skipped));
    }

    #[tokio::test]
    async fn test_edit_with_blank_input_keeps_original_and_pushes_once() {
        let mut git = staged_repo();
        let mut seq = Sequence::new();
        git.expect_commit()
            .withf(|m| m == "feat: original")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(String::new()));
        git.expect_push()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok("Everything up-to-date".to_string()));

        let (result, output) = run(git, replying(&["feat: original"]), prefs(false, true), "e\n\n").await;

        assert_eq!(result.unwrap(), committed("feat: original", PushStatus::Pushed));
        assert!(output.contains("Current message:"));
        assert!(output.contains("Empty message. Using original commit message."));
    }

    #[tokio::test]
    async fn test_edit_replaces_message() {
        let mut git = staged_repo();
        git.expect_commit()
            .withf(|m| m == "docs: rewrite readme")
            .times(1)
            .returning(|_| Ok(String::new()));

        let (result, _) = run(
            git,
            replying(&["docs: update"]),
            prefs(false, false),
            "e\n   docs: rewrite readme  \n",
        )
        .await;

        assert_eq!(result.unwrap(), committed("docs: rewrite readme", PushStatus::Skipped));
    }

    #[tokio::test]
    async fn test_edit_at_eof_keeps_original() {
        let mut git = staged_repo();
        git.expect_commit()
            .withf(|m| m == "feat: original")
            .times(1)
            .returning(|_| Ok(String::new()));

        let (result, _) = run(git, replying(&["feat: original"]), prefs(false, false), "e\n").await;

        assert_eq!(result.unwrap(), committed("feat: original", PushStatus::Skipped));
    }

    #[tokio::test]
    async fn test_cancel_after_regenerations_makes_no_commit() {
        let mut git = staged_repo();
        git.expect_commit().never();
        git.expect_push().never();

        let client = replying(&["feat: a", "feat: b"]);
        let (result, output) = run(git, client, prefs(false, true), "r\nc\n").await;

        assert_eq!(result.unwrap(), CommitOutcome::Cancelled);
        assert!(output.contains("Cancelling commit..."));
    }

    #[tokio::test]
    async fn test_invalid_choice_prompts_again() {
        let mut git = staged_repo();
        git.expect_commit().times(1).returning(|_| Ok(String::new()));

        let (result, output) = run(git, replying(&["feat: x"]), prefs(false, false), "maybe\nq\ny\n").await;

        assert!(result.is_ok());
        assert_eq!(output.matches("Invalid choice. Please try again.").count(), 2);
    }

    #[tokio::test]
    async fn test_eof_accepts() {
        let mut git = staged_repo();
        git.expect_commit()
            .withf(|m| m == "feat: x")
            .times(1)
            .returning(|_| Ok(String::new()));

        let (result, _) = run(git, replying(&["feat: x"]), prefs(false, false), "").await;

        assert_eq!(result.unwrap(), committed("feat: x", PushStatus::Skipped));
    }

    #[tokio::test]
    async fn test_generated_message_is_trimmed_before_commit() {
        let mut git = staged_repo();
        git.expect_commit()
            .withf(|m| m == "feat: x")
            .times(1)
            .returning(|_| Ok(String::new()));

        let (result, _) = run(git, replying(&["\n\n  feat: x  \n\n"]), prefs(false, false), "y\n").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_push_failure_still_succeeds() {
        let mut git = staged_repo();
        let mut seq = Sequence::new();
        git.expect_commit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(String::new()));
        git.expect_push()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| {
                Err(ProcessError::NonZeroExit {
                    command: "git push".to_string(),
                    code: 128,
                    stderr: "fatal: no upstream".to_string(),
                })
            });

        let (result, output) = run(git, replying(&["feat: x"]), prefs(false, true), "y\n").await;

        let outcome = result.unwrap();
        assert!(matches!(
            outcome,
            CommitOutcome::Committed {
                push: PushStatus::Failed(ref reason),
                ..
            } if reason.contains("no upstream")
        ));
        assert!(output.contains("Failed to push:"));
        assert!(output.contains("Commit was successful, but push failed."));
    }

    #[tokio::test]
    async fn test_interactive_generation_failure_ends_run() {
        let mut git = staged_repo();
        git.expect_commit().never();
        let mut client = MockChatClient::new();
        client.expect_complete().times(1).returning(|_, _| {
            Err(ProviderError::Api {
                provider: "Anthropic",
                status: 529,
                body: "overloaded".to_string(),
            })
        });

        let (result, _) = run(git, client, prefs(false, false), "y\n").await;

        assert!(matches!(result.unwrap_err(), CommitError::GenerationFailed { .. }));
    }

    #[tokio::test]
    async fn test_interactive_empty_reply_is_not_retried() {
        let mut git = staged_repo();
        git.expect_commit().never();

        let (result, _) = run(git, replying(&["  "]), prefs(false, false), "y\n").await;

        assert!(matches!(result.unwrap_err(), CommitError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_commit_failure_is_surfaced() {
        let mut git = staged_repo();
        git.expect_commit().times(1).returning(|_| {
            Err(ProcessError::Timeout {
                command: "git commit".to_string(),
                seconds: 30,
            })
        });
        git.expect_push().never();

        let (result, _) = run(git, replying(&["feat: x"]), prefs(false, true), "y\n").await;

        assert!(matches!(
            result.unwrap_err(),
            CommitError::Git(ProcessError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_auto_commit_commits_without_prompting() {
        let mut git = staged_repo();
        let mut seq = Sequence::new();
        git.expect_commit()
            .withf(|m| m == "chore: bump deps")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(String::new()));
        git.expect_push()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(String::new()));

        // Input would cancel if it were ever read.
        let (result, output) = run(git, replying(&["chore: bump deps"]), prefs(true, true), "c\n").await;

        assert_eq!(result.unwrap(), committed("chore: bump deps", PushStatus::Pushed));
        assert!(output.contains("Auto-committing..."));
        assert!(!output.contains("Commit with this message?"));
    }

    #[tokio::test]
    async fn test_auto_commit_generation_failure_makes_no_commit() {
        let mut git = staged_repo();
        git.expect_commit().never();
        git.expect_push().never();

        let (result, output) = run(git, replying(&[""]), prefs(true, true), "").await;

        assert!(matches!(result.unwrap_err(), CommitError::EmptyResponse));
        assert!(output.contains("Auto-commit aborted. No changes were committed."));
    }

    #[tokio::test]
    async fn test_auto_commit_connection_refused_is_cannot_connect() {
        let mut git = staged_repo();
        git.expect_commit().never();
        git.expect_push().never();
        let refused = refused_transport_error().await;
        let mut client = MockChatClient::new();
        client
            .expect_complete()
            .times(1)
            .return_once(move |_, _| Err(refused));

        let (result, _) = run(git, client, prefs(true, false), "").await;

        assert!(matches!(result.unwrap_err(), CommitError::CannotConnect(_)));
    }

    #[tokio::test]
    async fn test_unreadable_choice_accepts() {
        let mut git = staged_repo();
        git.expect_commit()
            .withf(|m| m == "feat: x")
            .times(1)
            .returning(|_| Ok(String::new()));

        // Not UTF-8, so read_line fails with InvalidData.
        let (result, _) = run_bytes(git, replying(&["feat: x"]), prefs(false, false), b"\xff\n").await;

        assert_eq!(result.unwrap(), committed("feat: x", PushStatus::Skipped));
    }

    #[tokio::test]
    async fn test_unreadable_edit_keeps_original() {
        let mut git = staged_repo();
        git.expect_commit()
            .withf(|m| m == "feat: original")
            .times(1)
            .returning(|_| Ok(String::new()));

        let (result, output) = run_bytes(
            git,
            replying(&["feat: original"]),
            prefs(false, false),
            b"e\n\xff\n",
        )
        .await;

        assert_eq!(result.unwrap(), committed("feat: original", PushStatus::Skipped));
        assert!(output.contains("Empty message. Using original commit message."));
    }

    #[tokio::test]
    async fn test_broken_terminal_after_commit_still_pushes() {
        let mut git = staged_repo();
        let mut seq = Sequence::new();
        git.expect_commit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("[main 1a2b3c] feat: x".to_string()));
        git.expect_push()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(String::new()));

        let mut terminal = BrokenTerminal::breaking_at("[main 1a2b3c]");
        let result = CommitWorkflow::new(
            git,
            replying(&["feat: x"]),
            prefs(true, true),
            &b""[..],
            &mut terminal,
        )
        .generate_and_commit()
        .await;

        assert_eq!(result.unwrap(), committed("feat: x", PushStatus::Pushed));
        assert!(!terminal.written.contains("Auto-pushing..."));
    }

    #[tokio::test]
    async fn test_broken_terminal_during_push_failure_keeps_commit() {
        let mut git = staged_repo();
        git.expect_commit().times(1).returning(|_| Ok(String::new()));
        git.expect_push().times(1).returning(|| {
            Err(ProcessError::NonZeroExit {
                command: "git push".to_string(),
                code: 1,
                stderr: "rejected".to_string(),
            })
        });

        let mut terminal = BrokenTerminal::breaking_at("Auto-pushing...");
        let result = CommitWorkflow::new(
            git,
            replying(&["feat: x"]),
            prefs(false, true),
            &b"y\n"[..],
            &mut terminal,
        )
        .generate_and_commit()
        .await;

        assert!(matches!(
            result.unwrap(),
            CommitOutcome::Committed {
                push: PushStatus::Failed(ref reason),
                ..
            } if reason.contains("rejected")
        ));
        assert!(!terminal.written.contains("Failed to push:"));
    }
}
