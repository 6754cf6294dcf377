use crate::api::ApiDoc;
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Routes nested under `/api`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/status", get(crate::api::handlers::status::service_status))
        .route("/jobs", post(crate::api::handlers::jobs::submit_job))
        .route("/jobs/{id}", get(crate::api::handlers::jobs::get_job))
        .route("/jobs/{id}/run", post(crate::api::handlers::jobs::run_job))
        .route(
            "/jobs/{id}/cancel",
            post(crate::api::handlers::jobs::cancel_job),
        )
        .route("/result", get(crate::api::handlers::results::get_result))
        .route("/download", get(crate::api::handlers::results::download))
}

/// The complete application: liveness, API, OpenAPI document, upload limit
/// and request tracing.
pub fn create_app(state: AppState) -> Router {
    let max_upload_bytes = state.config.server.max_upload_bytes;

    let app = Router::new()
        .route("/health", get(crate::api::handlers::status::health))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest("/api", create_router());

    #[cfg(feature = "swagger-ui")]
    let app = app.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/swagger.json", ApiDoc::openapi()),
    );

    app.layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
