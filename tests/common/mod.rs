//! Shared test helpers.

#![allow(dead_code)]

pub mod mocks;

use copyedit::utils::toml_config::CopyeditConfig;
use copyedit::AppState;
use mocks::MockLLMClient;
use std::path::Path;
use std::sync::Arc;

/// Configuration pointing the output store at `output_dir`, with a small
/// chunk size so short test texts span several chunks.
pub fn test_config(output_dir: &Path, max_chunk_size: usize) -> CopyeditConfig {
    let mut config = CopyeditConfig::default();
    config.storage.output_dir = output_dir.to_path_buf();
    config.editor.max_chunk_size = max_chunk_size;
    config
}

pub fn test_state(
    output_dir: &Path,
    max_chunk_size: usize,
    client: Arc<MockLLMClient>,
) -> AppState {
    AppState::new(test_config(output_dir, max_chunk_size), client)
}
