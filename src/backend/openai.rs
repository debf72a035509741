//! OpenAI chat-completions backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::registry::BackendPlugin;
use crate::backend::{BackendConfig, Generate, config_value};
use crate::error::BackendError;
use crate::ui;

pub const NAME: &str = "openai";

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o";
const REQUEST_TIMEOUT_SECS: u64 = 40;

const SYSTEM_PROMPT: &str =
    "You are an assistant that writes Conventional Commit messages. Output only the commit message; no code fences.";

pub struct OpenAiClient {
    api_key: String,
    endpoint: String,
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
impl Generate for OpenAiClient {
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
            .post(&self.endpoint)
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

        // No choices is a decodable-but-empty completion, not an error.
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}

pub struct OpenAiPlugin;

#[async_trait]
impl BackendPlugin for OpenAiPlugin {
    fn name(&self) -> &'static str {
        NAME
    }

    fn construct(&self, config: &BackendConfig) -> Result<Box<dyn Generate>, BackendError> {
        let api_key = config_value(config, "api_key")
            .ok_or_else(|| BackendError::MissingConfig {
                backend: NAME,
                detail: "missing api_key".to_string(),
            })?
            .to_string();
        let endpoint = config_value(config, "endpoint")
            .unwrap_or(DEFAULT_ENDPOINT)
            .to_string();
        let model = config_value(config, "model")
            .unwrap_or(DEFAULT_MODEL)
            .to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| BackendError::Setup(format!("failed to build HTTP client: {e}")))?;

        Ok(Box::new(OpenAiClient {
            api_key,
            endpoint,
            model,
            http,
        }))
    }

    async fn setup(&self) -> Result<BackendConfig, BackendError> {
        let api_key = ui::password("OpenAI API key (sk-...)")
            .map_err(|e| BackendError::Setup(e.to_string()))?;
        if api_key.trim().is_empty() {
            return Err(BackendError::Setup("API key required".to_string()));
        }
        let model = ui::input("Model name", DEFAULT_MODEL)
            .map_err(|e| BackendError::Setup(e.to_string()))?;

        let mut config = BackendConfig::new();
        config.insert("api_key".to_string(), api_key.trim().to_string());
        config.insert("model".to_string(), model.trim().to_string());
        Ok(config)
    }
}
