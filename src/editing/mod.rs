//! Copy-editing pipeline
//!
//! # Module Structure
//!
//! - [`editing::chunker`](crate::editing::chunker) - Paragraph-preserving text chunking
//! - [`editing::prompt`](crate::editing::prompt) - The fixed copy-editing instructions
//! - [`editing::editor`](crate::editing::editor) - Edit client, one model call per chunk
//! - [`editing::pipeline`](crate::editing::pipeline) - Sequential run over all chunks
//!
//! # Flow
//!
//! 1. **Probe** - the service must be up and the model installed
//! 2. **Chunk** - split the text on paragraph boundaries
//! 3. **Edit** - send each chunk, in order, to the model
//! 4. **Publish** - atomically replace the output artifact
//!
//! # Example
//!
//! ```ignore
//! use copyedit::editing::{CancelSignal, CopyEditor, EditorPipeline, RunRequest, TextChunker};
//! use copyedit::storage::OutputStore;
//!
//! let pipeline = EditorPipeline::new(
//!     TextChunker::new(4000),
//!     CopyEditor::new(client),
//!     OutputStore::new("text_files"),
//! );
//! pipeline.editor().ensure_available().await?;
//! let summary = pipeline
//!     .run(RunRequest { job_id, text: &text, estimated_chunks }, &CancelSignal::new(), |_| {})
//!     .await?;
//! ```

pub mod chunker;
pub mod editor;
pub mod pipeline;
pub mod prompt;

pub use chunker::{Chunk, TextChunker};
pub use editor::CopyEditor;
pub use pipeline::{CancelSignal, EditorPipeline, RunRequest};
