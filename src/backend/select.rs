//! Size-based backend selection.

/// Chooses a backend name from an optional explicit override and the
/// sanitized diff size. The threshold and the two names are data so new
/// backends can be substituted without touching the decision logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Sanitized payloads at or below this many bytes go to `hosted`.
    pub threshold_bytes: usize,
    /// Fast hosted backend for small diffs.
    pub hosted: String,
    /// Local, unbounded-context backend for large diffs.
    pub local: String,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            threshold_bytes: 20_000,
            hosted: crate::backend::openai::NAME.to_string(),
            local: crate::backend::ollama::NAME.to_string(),
        }
    }
}

impl SelectionPolicy {
    /// Explicit user intent always wins; otherwise the size threshold
    /// decides. Pure and total.
    pub fn select(&self, explicit: Option<&str>, sanitized_bytes: usize) -> String {
        if let Some(name) = explicit {
            if !name.trim().is_empty() {
                return name.to_string();
            }
        }
        if sanitized_bytes <= self.threshold_bytes {
            self.hosted.clone()
        } else {
            self.local.clone()
        }
    }
}
