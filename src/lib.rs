//! quill - draft Conventional Commit messages from your staged diff.
//!
//! # Overview
//!
//! quill collects the staged git diff, redacts credential-shaped text,
//! asks a pluggable generation backend for a Conventional Commit message,
//! repairs whatever comes back into the commit grammar, and walks the
//! result through an interactive approve/edit/regenerate loop before
//! committing.

pub mod app;
pub mod approve;
pub mod backend;
pub mod config;
pub mod error;
pub mod git;
pub mod message;
pub mod redact;
pub mod ui;

// Re-export commonly used types
pub use approve::{ApprovalLoop, Choice, Verdict};
pub use backend::{BackendConfig, BackendPlugin, BackendRegistry, Generate, SelectionPolicy};
pub use error::{BackendError, ConfigError, GitError, UiError};
pub use message::{CommitMessage, NormalizeOptions, PromptSpec};
pub use redact::RedactionStats;
