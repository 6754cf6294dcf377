//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Jobs (`/api/jobs`)
//! - `POST /api/jobs` - Submit uploaded files or pasted text (multipart)
//! - `GET /api/jobs/{id}` - Job status, chunk estimate and progress
//! - `POST /api/jobs/{id}/run` - Probe the editing service and start the run
//! - `POST /api/jobs/{id}/cancel` - Stop a running job
//!
//! ## Results
//! - `GET /api/result` - Latest edited text, line by line
//! - `GET /api/download?type=txt|docx` - Latest edited text as an attachment
//!
//! ## Status
//! - `GET /health` - Process liveness
//! - `GET /api/status` - Editing service probe
//!
//! Errors are returned as `{ "error": "<message>" }` with the status code of
//! the corresponding [`AppError`](crate::types::AppError) variant.
//!
//! # OpenAPI Documentation
//!
//! The OpenAPI document is served at `/api-docs/openapi.json`. When the
//! `swagger-ui` feature is enabled, interactive documentation is available at
//! `/swagger-ui/`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{
    JobResponse, JobStatus, Progress, ResultResponse, RunSummary, ServiceStatusResponse,
};
use utoipa::OpenApi;

/// OpenAPI description of the HTTP surface
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::status::health,
        handlers::status::service_status,
        handlers::jobs::submit_job,
        handlers::jobs::get_job,
        handlers::jobs::run_job,
        handlers::jobs::cancel_job,
        handlers::results::get_result,
        handlers::results::download,
    ),
    components(schemas(
        JobResponse,
        JobStatus,
        Progress,
        RunSummary,
        ServiceStatusResponse,
        ResultResponse
    )),
    tags(
        (name = "jobs", description = "Submission and run control"),
        (name = "results", description = "Edited output"),
        (name = "status", description = "Liveness and service probe")
    )
)]
pub struct ApiDoc;
