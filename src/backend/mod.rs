//! Pluggable text-generation backends.
//!
//! Each backend is a self-contained value holding only its own
//! configuration, constructed by its plugin's `construct` function. The
//! pipeline talks to backends exclusively through the [`Generate`]
//! capability.

pub mod ollama;
pub mod openai;
pub mod openrouter;
pub mod registry;
pub mod retry;
pub mod select;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::BackendError;

pub use registry::{BackendPlugin, BackendRegistry};
pub use retry::generate_with_retry;
pub use select::SelectionPolicy;

/// Opaque per-backend settings, owned by the backend implementation and
/// persisted by the config collaborator without interpretation.
pub type BackendConfig = BTreeMap<String, String>;

/// The single capability every backend exposes.
///
/// Implementations must bound their network call with a finite timeout and
/// map non-2xx responses to an error. A decodable-but-empty completion is a
/// success with empty text — emptiness is the normalizer's problem, and
/// backends never synthesize fallback text.
#[async_trait]
pub trait Generate: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, BackendError>;
}

impl std::fmt::Debug for dyn Generate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Generate")
    }
}

/// Config lookup that treats blank values as absent.
pub(crate) fn config_value<'a>(config: &'a BackendConfig, key: &str) -> Option<&'a str> {
    config.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}
