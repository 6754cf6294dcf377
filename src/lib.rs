//! # copyedit - Copy-editing server for long documents
//!
//! Sends long plain-text and Word documents through a locally hosted language
//! model (served by Ollama) for Chicago-style copy editing. Documents are
//! split into paragraph-aligned chunks, edited one chunk at a time, and
//! reassembled into a downloadable result.
//!
//! ## Overview
//!
//! copyedit can be used in two ways:
//!
//! 1. **As a standalone server or CLI** - Run the `copyedit-server` binary
//! 2. **As a library** - Drive the pipeline from your own Rust project
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use copyedit::{AppState, CopyeditConfig};
//! use copyedit::editing::{CancelSignal, RunRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::from_config(CopyeditConfig::default())?;
//!     let pipeline = &state.pipeline;
//!
//!     pipeline.editor().ensure_available().await?;
//!     let text = std::fs::read_to_string("draft.txt")?;
//!     let summary = pipeline
//!         .run(
//!             RunRequest {
//!                 job_id: uuid::Uuid::new_v4(),
//!                 text: &text,
//!                 estimated_chunks: pipeline.chunker().estimate_chunk_count(&text),
//!             },
//!             &CancelSignal::new(),
//!             |progress| println!("{:.0}%", progress.percent()),
//!         )
//!         .await?;
//!     println!("edited text written to {}", summary.artifact.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`cli`] - Command-line interface
//! - [`document`] - `.txt` / `.docx` decoding and encoding
//! - [`editing`] - Chunking, prompting and the edit pipeline
//! - [`jobs`] - Per-submission job registry
//! - [`llm`] - Language model client
//! - [`storage`] - Output artifact with atomic replacement
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// Document decoding and encoding (plain text, Word).
pub mod document;
/// Chunking, prompt and edit pipeline.
pub mod editing;
/// Job registry and run driver.
pub mod jobs;
/// Language model client abstractions.
pub mod llm;
/// Output artifact storage.
pub mod storage;
/// Core types (responses, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use editing::{CopyEditor, EditorPipeline, TextChunker};
pub use jobs::JobRegistry;
pub use llm::{LLMClient, OllamaClient};
pub use storage::OutputStore;
pub use types::{AppError, Result};
pub use utils::toml_config::CopyeditConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML-based configuration, loaded once at startup
    pub config: Arc<CopyeditConfig>,
    /// Submitted jobs and the single-run gate
    pub jobs: Arc<JobRegistry>,
    /// Chunker, edit client and output store
    pub pipeline: Arc<EditorPipeline>,
}

impl AppState {
    /// Assemble the state around any language model client.
    pub fn new(config: CopyeditConfig, client: Arc<dyn LLMClient>) -> Self {
        let pipeline = EditorPipeline::new(
            TextChunker::new(config.editor.max_chunk_size),
            CopyEditor::new(client),
            OutputStore::new(config.storage.output_dir.clone()),
        );

        let jobs = Arc::new(JobRegistry::with_retention(config.jobs.max_retained));

        Self {
            config: Arc::new(config),
            jobs,
            pipeline: Arc::new(pipeline),
        }
    }

    /// Assemble the state with an Ollama client built from `config.ollama`.
    pub fn from_config(config: CopyeditConfig) -> Result<Self> {
        let client = OllamaClient::from_config(&config.ollama)?;
        Ok(Self::new(config, Arc::new(client)))
    }
}
