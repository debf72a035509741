//! Interactive approval of a proposed commit message.
//!
//! Modeled as an explicit state machine: `Choice::parse` + [`transition`]
//! are the pure decision layer, [`ApprovalLoop::run`] is the effectful
//! shell, and all terminal/editor/commit side effects sit behind
//! [`ApprovalIo`] so the sequencing is testable with a fake.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::error::{BackendError, GitError, UiError};
use crate::message::{CommitMessage, NormalizeOptions, normalize};

/// A parsed user token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Approve,
    Edit,
    Regenerate,
    Cancel,
    Other(String),
}

impl Choice {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "a" | "approve" => Choice::Approve,
            "e" | "edit" => Choice::Edit,
            "r" | "regenerate" => Choice::Regenerate,
            "c" | "cancel" => Choice::Cancel,
            other => Choice::Other(other.to_string()),
        }
    }
}

/// What the shell must do next. Pure function of the choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Commit,
    OpenEditor,
    Regenerate,
    Cancel,
    Reprompt,
}

pub fn transition(choice: &Choice) -> Action {
    match choice {
        Choice::Approve => Action::Commit,
        Choice::Edit => Action::OpenEditor,
        Choice::Regenerate => Action::Regenerate,
        Choice::Cancel => Action::Cancel,
        Choice::Other(_) => Action::Reprompt,
    }
}

/// Terminal outcome of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Message committed via the git collaborator.
    Committed,
    /// No-commit mode: message printed, nothing invoked.
    Printed,
    Cancelled,
}

/// Failures that end the loop. Generation failures never appear here — a
/// failed regenerate keeps the current proposal with a warning.
#[derive(Error, Debug)]
pub enum ApprovalError {
    #[error("failed to read input: {0}")]
    Input(#[source] UiError),

    #[error("editor failed: {0}")]
    Editor(#[source] UiError),

    #[error("commit failed: {0}")]
    Commit(#[source] GitError),
}

/// Side effects the loop drives, one method per transition.
#[async_trait]
pub trait ApprovalIo: Send {
    fn show_proposal(&mut self, message: &CommitMessage);
    fn print_final(&mut self, message: &CommitMessage);
    fn warn(&mut self, text: &str);
    fn read_choice(&mut self) -> Result<String, UiError>;
    fn edit(&mut self, current: &str) -> Result<String, UiError>;
    fn commit(&mut self, message: &str) -> Result<(), GitError>;
    /// Re-run generation with the unchanged prompt.
    async fn regenerate(&mut self) -> Result<String, BackendError>;
}

pub struct ApprovalLoop {
    pub no_commit: bool,
    pub options: NormalizeOptions,
}

impl ApprovalLoop {
    /// Drive the proposal to a terminal state. Every proposed message has
    /// already passed through `normalize`, and every replacement passes
    /// through it again, so the grammar invariants hold at each iteration.
    pub async fn run<I: ApprovalIo>(
        &self,
        initial: CommitMessage,
        io: &mut I,
    ) -> Result<Verdict, ApprovalError> {
        let mut current = initial;

        loop {
            io.show_proposal(&current);
            let token = io.read_choice().map_err(ApprovalError::Input)?;
            let choice = Choice::parse(&token);
            debug!(?choice, "approval input");

            match transition(&choice) {
                Action::Commit => {
                    if self.no_commit {
                        io.print_final(&current);
                        return Ok(Verdict::Printed);
                    }
                    io.commit(&current.render())
                        .map_err(ApprovalError::Commit)?;
                    return Ok(Verdict::Committed);
                }
                Action::OpenEditor => {
                    let edited = io.edit(&current.render()).map_err(ApprovalError::Editor)?;
                    current = normalize(&edited, &self.options);
                }
                Action::Regenerate => match io.regenerate().await {
                    Ok(text) if !text.trim().is_empty() => {
                        current = normalize(&text, &self.options);
                    }
                    Ok(_) => {
                        io.warn("Regenerate returned nothing; keeping the current proposal.");
                    }
                    Err(e) => {
                        io.warn(&format!(
                            "Regenerate failed; keeping the current proposal ({e})"
                        ));
                    }
                },
                Action::Cancel => return Ok(Verdict::Cancelled),
                Action::Reprompt => {
                    io.warn(&format!("Unknown option: {token}"));
                }
            }
        }
    }
}
