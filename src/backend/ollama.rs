//! Ollama local-runtime backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::registry::BackendPlugin;
use crate::backend::{BackendConfig, Generate, config_value};
use crate::error::BackendError;
use crate::ui;

pub const NAME: &str = "ollama";

const DEFAULT_HOST: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "qwen2.5-coder:3b";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const PING_TIMEOUT_SECS: u64 = 2;

// Slightly under the typical server-side prompt limit to avoid truncation
// noise in the runtime's logs.
const DEFAULT_MAX_PROMPT_BYTES: usize = 3800;

pub struct OllamaClient {
    host: String,
    model: String,
    max_prompt_bytes: usize,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[async_trait]
impl Generate for OllamaClient {
    async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String, BackendError> {
        // Local models drift off-task easily; pin the instruction first and
        // clamp the payload so the server does not truncate mid-diff.
        let mut final_prompt = format!("Write a Conventional Commit message ONLY.\n{prompt}");
        if self.max_prompt_bytes > 0 && final_prompt.len() > self.max_prompt_bytes {
            final_prompt = truncate_utf8_bytes(&final_prompt, self.max_prompt_bytes);
        }

        let body = GenerateRequest {
            model: &self.model,
            prompt: &final_prompt,
            stream: false,
        };

        let response = self
            .http
            .post(format!("{}/api/generate", self.host.trim_end_matches('/')))
            .json(&body)
            .send()
            .await
            .map_err(|source| {
                // A refused connection means the runtime is down, which needs
                // setup rather than retry; everything else is a request error.
                if source.is_connect() {
                    BackendError::Unreachable {
                        backend: NAME,
                        host: self.host.clone(),
                        source,
                    }
                } else {
                    BackendError::Http {
                        backend: NAME,
                        source,
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                backend: NAME,
                status,
            });
        }

        let parsed: GenerateResponse =
            response
                .json()
                .await
                .map_err(|source| BackendError::Http {
                    backend: NAME,
                    source,
                })?;

        Ok(parsed.response)
    }
}

/// Trim to at most `max` bytes on a char boundary, marking the cut.
fn truncate_utf8_bytes(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n... [TRUNCATED]\n", &s[..end])
}

fn is_localhost(host: &str) -> bool {
    let h = host.to_lowercase();
    h.contains("localhost") || h.contains("127.0.0.1")
}

/// GET /api/tags with a short timeout; any HTTP answer counts as alive.
async fn ping(host: &str) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(PING_TIMEOUT_SECS))
        .build()
    {
        Ok(c) => c,
        Err(_) => return false,
    };
    match client
        .get(format!("{}/api/tags", host.trim_end_matches('/')))
        .send()
        .await
    {
        Ok(resp) => resp.status().as_u16() < 500,
        Err(_) => false,
    }
}

pub struct OllamaPlugin;

#[async_trait]
impl BackendPlugin for OllamaPlugin {
    fn name(&self) -> &'static str {
        NAME
    }

    fn construct(&self, config: &BackendConfig) -> Result<Box<dyn Generate>, BackendError> {
        let host = config_value(config, "host")
            .unwrap_or(DEFAULT_HOST)
            .to_string();
        let model = config_value(config, "model")
            .unwrap_or(DEFAULT_MODEL)
            .to_string();
        let timeout_seconds = config_value(config, "timeout_seconds")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let max_prompt_bytes = config_value(config, "max_prompt_bytes")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MAX_PROMPT_BYTES);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| BackendError::Setup(format!("failed to build HTTP client: {e}")))?;

        Ok(Box::new(OllamaClient {
            host,
            model,
            max_prompt_bytes,
            http,
        }))
    }

    async fn setup(&self) -> Result<BackendConfig, BackendError> {
        let host = ui::input("Ollama host", DEFAULT_HOST)
            .map_err(|e| BackendError::Setup(e.to_string()))?;
        let host = host.trim().to_string();
        let model = ui::input("Model name", DEFAULT_MODEL)
            .map_err(|e| BackendError::Setup(e.to_string()))?;
        let model = model.trim().to_string();

        if !ping(&host).await {
            return Err(BackendError::Setup(format!(
                "ollama server is not reachable at {host}. Start it with 'ollama serve' and re-run setup"
            )));
        }

        // Pull the model through the CLI when we are talking to a local
        // server and the binary is on PATH; a remote host manages its own
        // model store.
        if is_localhost(&host) && which::which("ollama").is_ok() {
            pull_model(&model).await?;
        }

        let mut config = BackendConfig::new();
        config.insert("host".to_string(), host);
        config.insert("model".to_string(), model);
        Ok(config)
    }

    async fn teardown(&self, config: &BackendConfig) -> Result<(), BackendError> {
        let host = config_value(config, "host").unwrap_or(DEFAULT_HOST);
        let model = config_value(config, "model").unwrap_or(DEFAULT_MODEL);

        // Remote hosts are not ours to stop.
        if !is_localhost(host) {
            return Ok(());
        }
        if which::which("ollama").is_err() {
            return Ok(());
        }

        // Best-effort: unload the running model session; the model itself
        // stays on disk.
        let status = tokio::process::Command::new("ollama")
            .arg("stop")
            .arg(model)
            .status()
            .await;
        if let Err(e) = status {
            debug!(error = %e, "ollama stop failed");
        }
        Ok(())
    }

    fn supports_teardown(&self) -> bool {
        true
    }
}

async fn pull_model(model: &str) -> Result<(), BackendError> {
    println!("Pulling model '{model}' (this may download several GB)...");
    let status = tokio::process::Command::new("ollama")
        .arg("pull")
        .arg(model)
        .status()
        .await
        .map_err(|e| BackendError::Setup(format!("failed to run 'ollama pull {model}': {e}")))?;
    if !status.success() {
        return Err(BackendError::Setup(format!(
            "'ollama pull {model}' exited with {status}"
        )));
    }
    Ok(())
}
