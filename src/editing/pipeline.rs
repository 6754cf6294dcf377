//! Editor pipeline: chunk, edit each chunk in order, publish the result.

use crate::editing::chunker::TextChunker;
use crate::editing::editor::CopyEditor;
use crate::storage::OutputStore;
use crate::types::{AppError, Progress, Result, RunSummary};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Cooperative cancellation for a run. Clones share the same flag.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this only returns once the flag is set
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Input of one run.
#[derive(Debug, Clone, Copy)]
pub struct RunRequest<'a> {
    pub job_id: Uuid,
    pub text: &'a str,
    /// Upfront estimate shown to the user before chunking
    pub estimated_chunks: usize,
}

pub struct EditorPipeline {
    chunker: TextChunker,
    editor: CopyEditor,
    store: OutputStore,
}

impl EditorPipeline {
    pub fn new(chunker: TextChunker, editor: CopyEditor, store: OutputStore) -> Self {
        Self {
            chunker,
            editor,
            store,
        }
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    pub fn editor(&self) -> &CopyEditor {
        &self.editor
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    /// Run the whole edit.
    ///
    /// Chunks are sent strictly one after another. The first failure aborts
    /// the run; the remaining chunks are never attempted and the previously
    /// published artifact stays as it was. `on_progress` is called once the
    /// chunk count is known and after every edited chunk.
    pub async fn run<F>(
        &self,
        request: RunRequest<'_>,
        cancel: &CancelSignal,
        mut on_progress: F,
    ) -> Result<RunSummary>
    where
        F: FnMut(Progress) + Send,
    {
        let start = Instant::now();
        let job_id = request.job_id;

        let chunks = self.chunker.chunk_with_metadata(request.text);
        if chunks.is_empty() {
            return Err(AppError::InvalidInput(
                "Nothing to edit: the submitted text is empty".to_string(),
            ));
        }

        let total = chunks.len();
        if total != request.estimated_chunks {
            debug!(
                job_id = %job_id,
                estimated = request.estimated_chunks,
                actual = total,
                "Chunk estimate differs from actual count"
            );
        }

        let mut progress = Progress {
            completed: 0,
            estimated_total: request.estimated_chunks,
            actual_total: Some(total),
        };
        on_progress(progress);

        info!(
            job_id = %job_id,
            chunks = total,
            model = %self.editor.model_name(),
            "Starting edit run"
        );

        let mut staged = self.store.begin()?;
        let mut characters_out = 0;

        for chunk in &chunks {
            let index = chunk.index;
            if cancel.is_cancelled() {
                return Err(cancelled(job_id, index, total));
            }

            debug!(job_id = %job_id, chunk = index + 1, size = chunk.size, "Editing chunk");
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.editor.edit(&chunk.content) => Some(result),
            };

            let edited = match outcome {
                None => return Err(cancelled(job_id, index, total)),
                Some(Ok(edited)) => edited,
                Some(Err(e)) => {
                    error!(
                        job_id = %job_id,
                        chunk = index + 1,
                        total,
                        size = chunk.size,
                        error = %e,
                        "Chunk edit failed, aborting run"
                    );
                    return Err(mid_run_failure(e, index, total));
                }
            };

            staged.append(&edited)?;
            characters_out += edited.chars().count();

            progress.completed = index + 1;
            on_progress(progress);
            info!(
                job_id = %job_id,
                completed = progress.completed,
                total,
                size_in = chunk.size,
                bytes_staged = staged.bytes_written(),
                percent = format!("{:.1}", progress.percent()),
                "Editing progress"
            );
        }

        let artifact = staged.commit()?;
        let summary = RunSummary {
            job_id,
            chunks: total,
            characters_in: request.text.chars().count(),
            characters_out,
            duration_ms: start.elapsed().as_millis() as u64,
            artifact,
        };

        info!(
            job_id = %job_id,
            chunks = summary.chunks,
            duration_ms = summary.duration_ms,
            artifact = %summary.artifact.display(),
            "Edit run completed"
        );

        Ok(summary)
    }
}

fn cancelled(job_id: Uuid, index: usize, total: usize) -> AppError {
    warn!(job_id = %job_id, completed = index, total, "Edit run cancelled");
    AppError::Cancelled(format!(
        "Run cancelled after {} of {} chunks",
        index, total
    ))
}

/// Once a run is underway any service failure is a run failure; the chunk
/// position is added for the user.
fn mid_run_failure(err: AppError, index: usize, total: usize) -> AppError {
    match err {
        AppError::ServiceUnavailable(msg) | AppError::ServiceError(msg) => AppError::ServiceError(
            format!("chunk {} of {} failed: {}", index + 1, total, msg),
        ),
        other => other,
    }
}
