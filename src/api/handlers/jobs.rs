//! Job submission and run control handlers.

use crate::{
    document::{combine_uploads, Upload},
    jobs,
    types::{AppError, JobResponse, Result},
    AppState,
};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

// ============================================================================
// Submission
// ============================================================================

/// How the text of a submission is supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitMode {
    UploadFile,
    UploadText,
}

impl SubmitMode {
    fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "upload_file" => Ok(SubmitMode::UploadFile),
            "upload_text" => Ok(SubmitMode::UploadText),
            other => Err(AppError::InvalidInput(format!(
                "Unknown mode '{}', expected 'upload_file' or 'upload_text'",
                other
            ))),
        }
    }
}

#[derive(Debug, Default)]
struct Submission {
    mode: Option<SubmitMode>,
    files: Vec<Upload>,
    text: Option<String>,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidInput(format!("Malformed form data: {}", err.body_text()))
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "mode" => {
                let value = field.text().await.map_err(multipart_error)?;
                submission.mode = Some(SubmitMode::parse(&value)?);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                submission.files.push(Upload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            "text" => {
                submission.text = Some(field.text().await.map_err(multipart_error)?);
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown form field");
            }
        }
    }

    Ok(submission)
}

/// Submit text for editing
///
/// Accepts `multipart/form-data` with `mode=upload_file` and one or more
/// `file` fields (`.txt` / `.docx`), or `mode=upload_text` and a `text`
/// field. Without `mode`, the presence of files decides.
#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "`mode`, `file` and `text` fields"
    ),
    responses(
        (status = 201, description = "Job created", body = JobResponse),
        (status = 400, description = "Missing file or text, bad extension, blank text"),
        (status = 413, description = "Upload too large"),
        (status = 422, description = "Unreadable document")
    ),
    tag = "jobs"
)]
pub async fn submit_job(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<JobResponse>)> {
    let submission = read_submission(multipart).await?;

    let mode = submission.mode.unwrap_or(if submission.files.is_empty() {
        SubmitMode::UploadText
    } else {
        SubmitMode::UploadFile
    });

    let (text, sources) = match mode {
        SubmitMode::UploadFile => {
            let text = combine_uploads(&submission.files)?;
            let sources = submission
                .files
                .iter()
                .map(|f| f.file_name.clone())
                .collect();
            (text, sources)
        }
        SubmitMode::UploadText => {
            let text = submission
                .text
                .ok_or_else(|| AppError::InvalidInput("Text box is blank".to_string()))?;
            (text, Vec::new())
        }
    };

    let estimated_chunks = state.pipeline.chunker().estimate_chunk_count(&text);
    let job = state.jobs.submit(text, sources, estimated_chunks)?;

    Ok((
        StatusCode::CREATED,
        Json(job.to_response(state.config.editor.seconds_per_chunk)),
    ))
}

// ============================================================================
// Status
// ============================================================================

/// Get a job's status and progress
#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    responses(
        (status = 200, description = "Job status", body = JobResponse),
        (status = 404, description = "Job not found")
    ),
    params(("id" = Uuid, Path, description = "Job id")),
    tag = "jobs"
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobResponse>> {
    let job = state.jobs.get(id)?;
    Ok(Json(job.to_response(state.config.editor.seconds_per_chunk)))
}

// ============================================================================
// Run Control
// ============================================================================

/// Start editing a job
///
/// The editing service is probed first; when it is unreachable or the model
/// is missing nothing is processed. The run itself continues in the
/// background, poll `GET /api/jobs/{id}` for progress.
#[utoipa::path(
    post,
    path = "/api/jobs/{id}/run",
    responses(
        (status = 202, description = "Run started", body = JobResponse),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Another run is active"),
        (status = 503, description = "Editing service unavailable")
    ),
    params(("id" = Uuid, Path, description = "Job id")),
    tag = "jobs"
)]
pub async fn run_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<JobResponse>)> {
    state.jobs.get(id)?;

    if let Err(e) = state.pipeline.editor().ensure_available().await {
        tracing::error!(job_id = %id, error = %e, "Health probe failed, run refused");
        return Err(e);
    }

    let ticket = state.jobs.start(id)?;
    tracing::info!(job_id = %id, "Run started");
    tokio::spawn(jobs::drive(
        state.jobs.clone(),
        state.pipeline.clone(),
        ticket,
    ));

    let job = state.jobs.get(id)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(job.to_response(state.config.editor.seconds_per_chunk)),
    ))
}

/// Cancel a running job
#[utoipa::path(
    post,
    path = "/api/jobs/{id}/cancel",
    responses(
        (status = 202, description = "Cancellation requested", body = JobResponse),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Job is not running")
    ),
    params(("id" = Uuid, Path, description = "Job id")),
    tag = "jobs"
)]
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<JobResponse>)> {
    state.jobs.cancel(id)?;
    let job = state.jobs.get(id)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(job.to_response(state.config.editor.seconds_per_chunk)),
    ))
}
