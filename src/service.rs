use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::{
    helpers::{config, excel},
    models::timesheet::TimesheetSubmission,
};

/// Content type for generated workbooks.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const FRONTEND_ORIGIN: &str = "http://localhost:3000";

/// The timesheet export service: wraps the engine behind a single
/// POST route and streams the generated workbook back to the caller.
#[derive(Clone)]
pub struct TimesheetService {
    pub config_path: PathBuf,
}

impl TimesheetService {
    /// Create a service reading engine settings from the given config path.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Create an Axum router for the timesheet service.
    pub fn router(self) -> Router {
        info!("Creating timesheet service router");
        let shared_state = Arc::new(self);

        let cors = CorsLayer::new()
            .allow_origin(HeaderValue::from_static(FRONTEND_ORIGIN))
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/export-timesheet", post(export_timesheet))
            .layer(cors)
            .with_state(shared_state)
    }
}

async fn export_timesheet(
    State(service): State<Arc<TimesheetService>>,
    Json(submission): Json<TimesheetSubmission>,
) -> Response {
    info!(
        "Received export request with {} project rows",
        submission.projects.len()
    );

    let config_path = service.config_path.clone();
    let exported = tokio::task::spawn_blocking(move || {
        let config = config::load_config_from(&config_path)
            .map_err(|e| excel::ExportError::Engine(e.to_string()))?;
        excel::export_timesheet(&submission, &config)
    })
    .await;

    let path = match exported {
        Ok(Ok(path)) => path,
        Ok(Err(e)) => {
            error!("Export engine returned an error: {e}");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
        Err(e) => {
            error!("Export task failed to complete: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Export task failed to complete.".to_string(),
            )
                .into_response();
        }
    };

    // The engine claimed success; verify the file actually landed before
    // streaming it. A miss here is a server-side integrity fault, not an
    // engine error, and is never retried.
    if !path.exists() {
        error!("Engine reported success but {} is missing", path.display());
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "File generated but not found on server.".to_string(),
        )
            .into_response();
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read generated file {}: {e}", path.display());
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "File generated but not found on server.".to_string(),
            )
                .into_response();
        }
    };

    info!(
        "Streaming {} ({} bytes) back to the caller",
        path.display(),
        bytes.len()
    );

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Timesheet.xlsx".to_string());

    (
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
