use crate::llm::client::{GenerationOptions, LLMClient};
use crate::types::{AppError, Result};
use crate::utils::toml_config::OllamaConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Deadline for the liveness and model lookups of the health probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    options: GenerationOptions,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Debug, Serialize)]
struct SamplingOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ShowRequest<'a> {
    name: &'a str,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, options: GenerationOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            options,
        })
    }

    pub fn from_config(config: &OllamaConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            GenerationOptions {
                temperature: config.temperature,
                timeout: config.request_timeout(),
                max_retries: config.max_retries,
            },
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Post one generation request, retrying transient failures, and return
    /// the decoded answer.
    async fn request_generation(&self, prompt: &str) -> Result<GenerateResponse> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: SamplingOptions {
                temperature: self.options.temperature,
            },
        };

        let mut attempt = 0;
        loop {
            match self.attempt_generation(&url, &body).await {
                Ok(payload) => return Ok(payload),
                Err(AttemptError::Transport(e))
                    if is_transient(&e) && attempt < self.options.max_retries =>
                {
                    attempt += 1;
                    warn!(
                        model = %self.model,
                        attempt,
                        error = %e,
                        "Transient Ollama failure, retrying"
                    );
                }
                Err(AttemptError::Transport(e)) => {
                    return Err(AppError::ServiceUnavailable(format!(
                        "Ollama request failed: {}",
                        e
                    )));
                }
                Err(AttemptError::Answered(e)) => return Err(e),
            }
        }
    }

    async fn attempt_generation(
        &self,
        url: &str,
        body: &GenerateRequest<'_>,
    ) -> std::result::Result<GenerateResponse, AttemptError> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(AttemptError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AttemptError::Answered(AppError::ServiceUnavailable(format!(
                "Ollama returned {}: {}",
                status,
                detail.trim()
            ))));
        }

        // The client deadline also covers reading the body
        response.json().await.map_err(|e| {
            if e.is_timeout() {
                AttemptError::Transport(e)
            } else {
                AttemptError::Answered(AppError::ServiceError(format!(
                    "Malformed Ollama response: {}",
                    e
                )))
            }
        })
    }
}

/// Why a single generation attempt failed.
enum AttemptError {
    /// The exchange with the server broke off
    Transport(reqwest::Error),
    /// The server answered, but not with a usable generation
    Answered(AppError),
}

/// Connection failures and timeouts are worth one more try; anything the
/// server actually answered is not.
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let payload = self.request_generation(prompt).await?;

        if let Some(error) = payload.error {
            return Err(AppError::ServiceError(format!("Ollama error: {}", error)));
        }

        let text = payload
            .response
            .ok_or_else(|| AppError::ServiceError("Ollama response had no text".to_string()))?;

        debug!(model = %self.model, chars = text.len(), "Generation finished");
        Ok(text)
    }

    async fn health_check(&self) -> Result<()> {
        let live = self
            .http
            .get(&self.base_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                AppError::ServiceUnavailable(format!(
                    "Ollama server at {} is not reachable: {}",
                    self.base_url, e
                ))
            })?;

        if !live.status().is_success() {
            return Err(AppError::ServiceUnavailable(format!(
                "Ollama server at {} answered {}",
                self.base_url,
                live.status()
            )));
        }

        let show = self
            .http
            .post(format!("{}/api/show", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .json(&ShowRequest { name: &self.model })
            .send()
            .await
            .map_err(|e| {
                AppError::ServiceUnavailable(format!("Model lookup failed: {}", e))
            })?;

        if !show.status().is_success() {
            return Err(AppError::ServiceUnavailable(format!(
                "Model '{}' is not installed on the Ollama server",
                self.model
            )));
        }

        Ok(())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
