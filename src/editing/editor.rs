use crate::editing::prompt::build_edit_prompt;
use crate::llm::LLMClient;
use crate::types::Result;
use std::sync::Arc;

/// Separator appended to each edited chunk so reassembled chunks stay
/// visually apart.
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Edit client: one generation request per chunk.
#[derive(Clone)]
pub struct CopyEditor {
    client: Arc<dyn LLMClient>,
}

impl CopyEditor {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Health probe gating a run: service reachable and model installed.
    pub async fn ensure_available(&self) -> Result<()> {
        self.client.health_check().await
    }

    /// Copy-edit one chunk. The result is trimmed and terminated by
    /// [`CHUNK_SEPARATOR`].
    pub async fn edit(&self, text: &str) -> Result<String> {
        let prompt = build_edit_prompt(text);
        let response = self.client.generate(&prompt).await?;
        Ok(format!("{}{}", response.trim(), CHUNK_SEPARATOR))
    }
}
