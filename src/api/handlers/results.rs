//! Result display and download handlers.

use crate::{
    document::{edited_file_name, encode, DocumentFormat},
    types::{DownloadQuery, Result, ResultResponse},
    AppState,
};
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

/// Get the latest edited text, line by line
#[utoipa::path(
    get,
    path = "/api/result",
    responses(
        (status = 200, description = "Latest edited text", body = ResultResponse),
        (status = 404, description = "No edit has completed yet")
    ),
    tag = "results"
)]
pub async fn get_result(State(state): State<AppState>) -> Result<Json<ResultResponse>> {
    let text = state.pipeline.store().read_latest()?;
    Ok(Json(ResultResponse {
        characters: text.chars().count(),
        lines: text.lines().map(str::to_string).collect(),
    }))
}

/// Download the latest edited text as `.txt` or `.docx`
///
/// The attachment is named after the first uploaded file of the run that
/// produced it (`report.docx` becomes `report_edited.docx`), or `edited.txt` /
/// `edited.docx` for pasted text.
#[utoipa::path(
    get,
    path = "/api/download",
    params(DownloadQuery),
    responses(
        (status = 200, description = "Edited document attachment"),
        (status = 400, description = "Unknown document type"),
        (status = 404, description = "No edit has completed yet")
    ),
    tag = "results"
)]
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response> {
    let format = match query.kind.as_deref() {
        Some(kind) => kind.parse::<DocumentFormat>()?,
        None => DocumentFormat::PlainText,
    };

    let text = state.pipeline.store().read_latest()?;
    let bytes = encode(&text, format)?;

    let source = state
        .jobs
        .last_published()
        .and_then(|run| run.sources.into_iter().next());
    let file_name = edited_file_name(source.as_deref(), format);
    let disposition = format!("attachment; filename=\"{}\"", file_name);

    tracing::info!(
        format = format.extension(),
        bytes = bytes.len(),
        file_name = %file_name,
        "Serving download"
    );

    Ok((
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
