//! One-shot `edit` command
//!
//! Runs the same pipeline as the server, in the foreground: probe the
//! editing service, edit every chunk while printing progress, then export the
//! result. File inputs are exported next to the first file as
//! `{stem}_edited.{ext}` unless `--output` says otherwise. Ctrl-C cancels the
//! run and leaves the previous artifact in place.

use super::output::Output;
use crate::document::{combine_uploads, edited_file_name, encode, DocumentFormat, Upload};
use crate::editing::RunRequest;
use crate::types::{AppError, Result, RunSummary};
use crate::AppState;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// What the `edit` command works on
#[derive(Debug, Clone)]
pub enum EditInput {
    /// Literal text from `--text`
    Text(String),
    /// Standard input (`-`)
    Stdin,
    /// One or more `.txt` / `.docx` files, joined in order
    Files(Vec<PathBuf>),
}

impl EditInput {
    pub fn from_args(inputs: Vec<PathBuf>, text: Option<String>) -> Self {
        match text {
            Some(text) => EditInput::Text(text),
            None if inputs.len() == 1 && inputs[0] == Path::new("-") => EditInput::Stdin,
            None => EditInput::Files(inputs),
        }
    }

    /// Load the text and the names of its sources.
    pub fn load(self) -> Result<(String, Vec<String>)> {
        match self {
            EditInput::Text(text) => Ok((text, Vec::new())),
            EditInput::Stdin => {
                let mut bytes = Vec::new();
                std::io::stdin()
                    .read_to_end(&mut bytes)
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read stdin: {}", e)))?;
                Ok((crate::document::decode_text_lossy(&bytes), Vec::new()))
            }
            EditInput::Files(paths) => {
                let uploads = paths
                    .iter()
                    .map(|path| {
                        let bytes = fs::read(path).map_err(|e| {
                            AppError::InvalidInput(format!(
                                "Cannot read {}: {}",
                                path.display(),
                                e
                            ))
                        })?;
                        let file_name = path
                            .file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or_default()
                            .to_string();
                        Ok(Upload { file_name, bytes })
                    })
                    .collect::<Result<Vec<_>>>()?;

                let text = combine_uploads(&uploads)?;
                Ok((text, uploads.into_iter().map(|u| u.file_name).collect()))
            }
        }
    }
}

/// Options of one `edit` invocation
#[derive(Debug, Clone)]
pub struct EditOptions {
    pub input: EditInput,
    pub output: Option<PathBuf>,
    pub format: Option<String>,
}

/// Pick the export format: `--format` wins, then the output extension.
pub fn export_format(output: &Path, format: Option<&str>) -> Result<DocumentFormat> {
    match format {
        Some(format) => format.parse(),
        None => DocumentFormat::from_file_name(&output.to_string_lossy()),
    }
}

/// Where the result goes without `--output`: beside the first input file,
/// named after it. Text and stdin inputs only update the artifact.
pub fn default_export_path(input: &EditInput, format: Option<&str>) -> Result<Option<PathBuf>> {
    let first = match input {
        EditInput::Files(paths) => match paths.first() {
            Some(first) => first,
            None => return Ok(None),
        },
        EditInput::Text(_) | EditInput::Stdin => return Ok(None),
    };

    let name = first.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let format = match format {
        Some(format) => format.parse()?,
        None => DocumentFormat::from_file_name(name)?,
    };
    Ok(Some(first.with_file_name(edited_file_name(Some(name), format))))
}

/// Run the edit and export the result.
pub async fn run(state: &AppState, options: EditOptions, output: &Output) -> Result<RunSummary> {
    let target = match &options.output {
        Some(path) => Some(path.clone()),
        None => default_export_path(&options.input, options.format.as_deref())?,
    };
    let export = match target {
        Some(path) => {
            let format = export_format(&path, options.format.as_deref())?;
            Some((path, format))
        }
        None => None,
    };

    let (text, sources) = options.input.load()?;
    let estimated_chunks = state.pipeline.chunker().estimate_chunk_count(&text);
    let job = state.jobs.submit(text, sources, estimated_chunks)?;

    output.info(&format!(
        "{} characters, about {} chunk(s), roughly {}s",
        job.text.chars().count(),
        estimated_chunks,
        estimated_chunks as u64 * state.config.editor.seconds_per_chunk
    ));

    state.pipeline.editor().ensure_available().await?;
    output.success(&format!(
        "Model {} is ready",
        state.pipeline.editor().model_name()
    ));

    let ticket = state.jobs.start(job.id)?;
    let interrupt = {
        let cancel = ticket.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let request = RunRequest {
        job_id: ticket.job_id,
        text: &ticket.text,
        estimated_chunks: ticket.estimated_chunks,
    };
    let outcome = state
        .pipeline
        .run(request, &ticket.cancel, |progress| {
            state.jobs.update_progress(ticket.job_id, progress);
            if progress.completed > 0 {
                output.progress(
                    progress.completed,
                    progress.actual_total.unwrap_or(progress.estimated_total),
                    progress.percent(),
                );
            }
        })
        .await;

    interrupt.abort();
    state.jobs.finish(ticket.job_id, &outcome);
    let summary = outcome?;

    output.success(&format!(
        "Edited {} chunk(s) in {:.1}s",
        summary.chunks,
        summary.duration_ms as f64 / 1000.0
    ));
    output.kv("artifact", &summary.artifact.display().to_string());

    if let Some((path, format)) = export {
        let text = state.pipeline.store().read_latest()?;
        fs::write(&path, encode(&text, format)?)?;
        output.created(format.extension(), &path.display().to_string());
    }

    Ok(summary)
}
