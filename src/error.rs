//! Error types for quill modules using thiserror.

use thiserror::Error;

/// Errors from generation backends and the registry.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("unknown backend '{name}'. Known backends: {known}")]
    Unknown { name: String, known: String },

    #[error("{backend} is not configured ({detail}). Run: quill setup --backend {backend}")]
    MissingConfig {
        backend: &'static str,
        detail: String,
    },

    #[error("{backend} runtime is not reachable at {host}. Start it (or run 'quill setup --backend {backend}'): {source}")]
    Unreachable {
        backend: &'static str,
        host: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{backend} request failed: {source}")]
    Http {
        backend: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{backend} rejected the request with status {status}")]
    Status {
        backend: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("{backend} returned an unexpected response: {detail}")]
    InvalidResponse {
        backend: &'static str,
        detail: String,
    },

    #[error("all retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<BackendError>),

    #[error("setup failed: {0}")]
    Setup(String),
}

impl BackendError {
    /// Transient failures worth retrying: transport-level errors and
    /// rate-limit/server statuses. Everything else fails immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Http { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            BackendError::Status { status, .. } => {
                status.as_u16() == 429 || status.is_server_error()
            }
            _ => false,
        }
    }
}

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("no staged changes. Use `git add` first")]
    NoStagedChanges,

    #[error("failed to collect staged diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("git config error (missing user.name or user.email): {0}")]
    Signature(#[source] git2::Error),
}

/// Errors from loading/saving the persisted configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine a config directory for this platform")]
    NoConfigDir,

    #[error("failed to read config: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to write config: {0}")]
    Write(#[source] std::io::Error),
}

/// Errors from terminal interaction (menus, editor round-trips).
#[derive(Error, Debug)]
pub enum UiError {
    #[error("terminal input failed: {0}")]
    Io(#[source] std::io::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[source] dialoguer::Error),

    #[error("editor '{editor}' exited with {status}")]
    EditorFailed { editor: String, status: String },

    #[error("cancelled")]
    Cancelled,
}
