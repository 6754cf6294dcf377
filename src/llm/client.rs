//! LLM client abstraction
//!
//! The editing pipeline only ever talks to a generation backend through the
//! [`LLMClient`] trait, which keeps the pipeline testable against scripted
//! clients and leaves room for backends other than Ollama.

use crate::types::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt (single, non-streaming request)
    ///
    /// Fails with `ServiceUnavailable` when the backend cannot be reached or
    /// answers with a non-success status, and with `ServiceError` when it
    /// answers but produces no usable text.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Confirm the backend is reachable and the configured model is installed
    async fn health_check(&self) -> Result<()>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Generation settings shared by every request a client issues
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature; kept low so edits stay conservative
    pub temperature: f32,
    /// Deadline for one request, including reading the response
    pub timeout: Duration,
    /// Extra attempts after a transient network failure
    pub max_retries: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            timeout: Duration::from_secs(300),
            max_retries: 1,
        }
    }
}
