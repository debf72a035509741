//! OpenRouter chat-completions backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::registry::BackendPlugin;
use crate::backend::{BackendConfig, Generate, config_value};
use crate::error::BackendError;
use crate::ui;

pub const NAME: &str = "openrouter";

const ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MODEL: &str = "qwen/qwen3-coder:free";
const REQUEST_TIMEOUT_SECS: u64 = 60;

const SYSTEM_PROMPT: &str =
    "You are an assistant that writes Conventional Commit messages. Output only the commit message; no code fences.";

/// Free models worth offering as defaults during setup.
const VARIANTS: [&str; 3] = [
    "qwen/qwen3-coder:free",
    "qwen/qwen3-235b-a22b:free",
    "deepseek/deepseek-r1:free",
];

pub struct OpenRouterClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl Generate for OpenRouterClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, BackendError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: (max_tokens > 0).then_some(max_tokens),
            temperature: 0.2,
        };

        let response = self
            .http
            .post(ENDPOINT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|source| BackendError::Http {
                backend: NAME,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                backend: NAME,
                status,
            });
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|source| BackendError::Http {
                    backend: NAME,
                    source,
                })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}

pub struct OpenRouterPlugin;

#[async_trait]
impl BackendPlugin for OpenRouterPlugin {
    fn name(&self) -> &'static str {
        NAME
    }

    fn construct(&self, config: &BackendConfig) -> Result<Box<dyn Generate>, BackendError> {
        let api_key = config_value(config, "api_key")
            .ok_or_else(|| BackendError::MissingConfig {
                backend: NAME,
                detail: "missing api_key; create one at https://openrouter.ai/settings/keys"
                    .to_string(),
            })?
            .to_string();
        let model = config_value(config, "model")
            .unwrap_or(DEFAULT_MODEL)
            .to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| BackendError::Setup(format!("failed to build HTTP client: {e}")))?;

        Ok(Box::new(OpenRouterClient {
            api_key,
            model,
            http,
        }))
    }

    async fn setup(&self) -> Result<BackendConfig, BackendError> {
        println!("OpenRouter setup");
        println!("1) Visit https://openrouter.ai/settings/keys and create a free API key.");
        println!("2) Paste your key below. It is stored locally in quill's config file.");

        let api_key = ui::password("OpenRouter API key")
            .map_err(|e| BackendError::Setup(e.to_string()))?;
        if api_key.trim().is_empty() {
            return Err(BackendError::Setup("API key is required".to_string()));
        }

        let variants = self.variants();
        let model = match ui::select("Select a default OpenRouter model:", &variants, 0) {
            Ok(idx) => variants[idx].to_string(),
            Err(_) => DEFAULT_MODEL.to_string(),
        };

        let mut config = BackendConfig::new();
        config.insert("api_key".to_string(), api_key.trim().to_string());
        config.insert("model".to_string(), model);
        Ok(config)
    }

    fn variants(&self) -> Vec<&'static str> {
        VARIANTS.to_vec()
    }
}
