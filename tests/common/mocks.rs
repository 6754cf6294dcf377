//! Mock implementations for testing.
//!
//! This module provides a mock LLM client that can be used across different
//! test files without duplication.

use async_trait::async_trait;
use copyedit::llm::LLMClient;
use copyedit::types::{AppError, Result};
use parking_lot::Mutex;
use std::time::Duration;

/// Mock LLM client for testing with configurable responses.
///
/// Replies with a fixed text (or `edited <n>` for the n-th call), can fail on
/// a given call, refuse the health probe, or hold each call for a while so a
/// run stays active. Every prompt it receives is recorded.
///
/// # Examples
///
/// ```ignore
/// let client = MockLLMClient::new("Edited.");
/// let client = MockLLMClient::numbered().failing_on(2);
/// let client = MockLLMClient::new("x").unavailable();
/// ```
pub struct MockLLMClient {
    response: Option<String>,
    fail_on: Option<usize>,
    available: bool,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            fail_on: None,
            available: true,
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock client that answers `edited <n>` to the n-th call.
    pub fn numbered() -> Self {
        Self {
            response: None,
            ..Self::new("")
        }
    }

    /// Fail the given (1-based) call with a service error.
    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on = Some(call);
        self
    }

    /// Refuse the health probe.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Hold every generation call for `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Prompts received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let call = {
            let mut prompts = self.prompts.lock();
            prompts.push(prompt.to_string());
            prompts.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_on == Some(call) {
            return Err(AppError::ServiceError("Mock LLM failure".to_string()));
        }

        Ok(match &self.response {
            Some(response) => response.clone(),
            None => format!("edited {}", call),
        })
    }

    async fn health_check(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(AppError::ServiceUnavailable(
                "Mock service is down".to_string(),
            ))
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
