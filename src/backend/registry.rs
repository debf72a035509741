//! Backend registry: name → construction/setup/teardown recipe.
//!
//! An explicit instance built in `main` and passed by reference into the
//! pipeline — nothing process-global, so tests construct their own.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::warn;

use crate::backend::{BackendConfig, Generate};
use crate::error::BackendError;

/// Construction/setup/teardown recipe for one backend.
///
/// `teardown` and `variants` are optional in the sense that the defaults do
/// nothing; a plugin overrides what it supports.
#[async_trait]
pub trait BackendPlugin: Send + Sync {
    /// Unique registry key.
    fn name(&self) -> &'static str;

    /// Build a generator from persisted settings. Validation errors (e.g. a
    /// missing API key) surface unchanged to the caller.
    fn construct(&self, config: &BackendConfig) -> Result<Box<dyn Generate>, BackendError>;

    /// Interactive first-time configuration; returns the settings map to
    /// persist.
    async fn setup(&self) -> Result<BackendConfig, BackendError>;

    /// Release local resources held by the backend (stop a runtime, unload
    /// a model). Default: nothing to do.
    async fn teardown(&self, _config: &BackendConfig) -> Result<(), BackendError> {
        Ok(())
    }

    /// Whether `teardown` does anything for this backend.
    fn supports_teardown(&self) -> bool {
        false
    }

    /// Known model identifiers to offer during setup, in preference order.
    fn variants(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Name-keyed plugin registry. Reads are concurrent; registration takes the
/// write lock and is expected only during startup wiring.
pub struct BackendRegistry {
    plugins: RwLock<HashMap<&'static str, Arc<dyn BackendPlugin>>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(HashMap::new()),
        }
    }

    /// Registry with the built-in backends wired in.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(crate::backend::openai::OpenAiPlugin));
        registry.register(Arc::new(crate::backend::openrouter::OpenRouterPlugin));
        registry.register(Arc::new(crate::backend::ollama::OllamaPlugin));
        registry
    }

    /// Register a plugin under its own name. A duplicate name replaces the
    /// earlier registration (plugin-style override) and logs a warning.
    pub fn register(&self, plugin: Arc<dyn BackendPlugin>) {
        let name = plugin.name();
        let mut plugins = self.plugins.write().expect("registry lock poisoned");
        if plugins.insert(name, plugin).is_some() {
            warn!(backend = name, "duplicate backend registration; last wins");
        }
    }

    /// Build a generator by backend name, delegating entirely to the
    /// plugin's `construct`.
    pub fn create(
        &self,
        name: &str,
        config: &BackendConfig,
    ) -> Result<Box<dyn Generate>, BackendError> {
        match self.plugin_for(name) {
            Some(plugin) => plugin.construct(config),
            None => Err(BackendError::Unknown {
                name: name.to_string(),
                known: self.known().join(", "),
            }),
        }
    }

    /// Registered backend names, sorted for stable display.
    pub fn known(&self) -> Vec<String> {
        let plugins = self.plugins.read().expect("registry lock poisoned");
        let mut names: Vec<String> = plugins.keys().map(|n| n.to_string()).collect();
        names.sort();
        names
    }

    pub fn plugin_for(&self, name: &str) -> Option<Arc<dyn BackendPlugin>> {
        let plugins = self.plugins.read().expect("registry lock poisoned");
        plugins.get(name).cloned()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakePlugin {
        name: &'static str,
        fail_construct: bool,
    }

    struct FakeGenerator;

    #[async_trait]
    impl Generate for FakeGenerator {
        async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, BackendError> {
            Ok("feat: fake".to_string())
        }
    }

    #[async_trait]
    impl BackendPlugin for FakePlugin {
        fn name(&self) -> &'static str {
            self.name
        }

        fn construct(&self, _config: &BackendConfig) -> Result<Box<dyn Generate>, BackendError> {
            if self.fail_construct {
                Err(BackendError::MissingConfig {
                    backend: self.name,
                    detail: "missing api_key".to_string(),
                })
            } else {
                Ok(Box::new(FakeGenerator))
            }
        }

        async fn setup(&self) -> Result<BackendConfig, BackendError> {
            Ok(BackendConfig::new())
        }
    }

    #[test]
    fn test_unknown_backend_lists_known_names() {
        let registry = BackendRegistry::new();
        registry.register(Arc::new(FakePlugin {
            name: "alpha",
            fail_construct: false,
        }));
        registry.register(Arc::new(FakePlugin {
            name: "beta",
            fail_construct: false,
        }));

        let err = registry
            .create("nonexistent", &BackendConfig::new())
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nonexistent"));
        assert!(msg.contains("alpha"));
        assert!(msg.contains("beta"));
    }

    #[test]
    fn test_create_delegates_to_plugin() {
        let registry = BackendRegistry::new();
        registry.register(Arc::new(FakePlugin {
            name: "alpha",
            fail_construct: false,
        }));
        assert!(registry.create("alpha", &BackendConfig::new()).is_ok());
    }

    #[test]
    fn test_construct_errors_propagate_unchanged() {
        let registry = BackendRegistry::new();
        registry.register(Arc::new(FakePlugin {
            name: "alpha",
            fail_construct: true,
        }));
        let err = registry
            .create("alpha", &BackendConfig::new())
            .unwrap_err();
        assert!(matches!(err, BackendError::MissingConfig { .. }));
    }

    #[test]
    fn test_duplicate_registration_last_wins() {
        let registry = BackendRegistry::new();
        registry.register(Arc::new(FakePlugin {
            name: "alpha",
            fail_construct: true,
        }));
        registry.register(Arc::new(FakePlugin {
            name: "alpha",
            fail_construct: false,
        }));
        assert!(registry.create("alpha", &BackendConfig::new()).is_ok());
        assert_eq!(registry.known(), vec!["alpha".to_string()]);
    }

    #[test]
    fn test_builtins_are_registered() {
        let registry = BackendRegistry::with_builtins();
        assert_eq!(
            registry.known(),
            vec![
                "ollama".to_string(),
                "openai".to_string(),
                "openrouter".to_string()
            ]
        );
    }
}
