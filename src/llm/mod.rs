//! LLM Client Abstractions
//!
//! The copy editor reaches the text-generation backend through the
//! [`LLMClient`] trait. The only backend shipped is a local Ollama server,
//! spoken to over its REST API:
//!
//! - `GET /` - liveness
//! - `POST /api/show` - model lookup, used by the health probe
//! - `POST /api/generate` - one non-streaming completion per call
//!
//! # Example
//!
//! ```ignore
//! use copyedit::llm::{GenerationOptions, LLMClient, OllamaClient};
//!
//! let client = OllamaClient::new(
//!     "http://localhost:11434".to_string(),
//!     "llama3.2".to_string(),
//!     GenerationOptions::default(),
//! )?;
//! client.health_check().await?;
//! let text = client.generate("Fix: teh cat").await?;
//! ```

/// Core LLM client trait and generation options.
pub mod client;
/// Ollama REST client.
pub mod ollama;

pub use client::{GenerationOptions, LLMClient};
pub use ollama::OllamaClient;
