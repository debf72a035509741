//! Commit message construction: prompt rendering, normalization of backend
//! output into the Conventional Commit grammar, and the generation-free
//! fallback composer.

pub mod fallback;
pub mod normalize;
pub mod prompt;

pub use fallback::fallback_from_diff;
pub use normalize::{NormalizeOptions, normalize};
pub use prompt::{PromptSpec, build_prompt};

/// Conventional Commit types quill will accept in a title.
pub const ALLOWED_TYPES: [&str; 8] = [
    "feat", "fix", "refactor", "docs", "chore", "style", "test", "perf",
];

/// Hard ceiling for the title line, in bytes.
pub const MAX_TITLE_LEN: usize = 72;

/// Wrap column for body lines.
pub const MAX_BODY_LINE_LEN: usize = 100;

/// Type used when the backend output carries no recognizable type.
pub const DEFAULT_TYPE: &str = "chore";

/// A validated Conventional Commit message.
///
/// Invariants are enforced by [`normalize`]: the title matches
/// `type(scope)?: subject` for an allowed type, the title fits the length
/// ceiling, and every body line fits the wrap column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub title: String,
    pub body: Option<String>,
}

impl CommitMessage {
    pub fn title_only(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
        }
    }

    /// Serialize for git: title, then a single blank line before the body.
    pub fn render(&self) -> String {
        match &self.body {
            Some(body) if !body.trim().is_empty() => format!("{}\n\n{}", self.title, body),
            _ => self.title.clone(),
        }
    }
}

impl std::fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}
