//! HTTP request handlers for the RiskLens API.
//!
//! # Endpoints
//!
//! - `GET /` - Landing link to the upload endpoint
//! - `POST /model_page/` - Upload a CSV and analyze it
//! - `GET /clean_dataset_page/` - Analyze the bundled clean dataset
//! - `GET /dirty_dataset_page/` - Analyze the bundled dirty dataset
//! - `GET /health` - Health check endpoint

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::analysis::ThreatAnalyzer;
use crate::dataset::SampleDataset;
use crate::error::{AnalysisError, StorageError, UploadError};
use crate::upload::{read_submission, FormErrors, UploadStore};

/// Body of the landing page.
pub const HOME_PAGE_HTML: &str = r#"<a href="model_page/">home.html</a>"#;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<A: ThreatAnalyzer> {
    /// The analysis function every endpoint delegates to
    pub analyzer: Arc<A>,

    /// Storage for uploaded CSV files
    pub store: Arc<UploadStore>,

    /// Directory holding the sample datasets
    pub base_dir: Arc<PathBuf>,
}

impl<A: ThreatAnalyzer> AppState<A> {
    /// Create a new application state.
    pub fn new(analyzer: A, store: UploadStore, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            store: Arc::new(store),
            base_dir: Arc::new(base_dir.into()),
        }
    }

    /// Path of a sample dataset under the base directory.
    pub fn dataset_path(&self, dataset: SampleDataset) -> PathBuf {
        dataset.path(&self.base_dir)
    }
}

impl<A: ThreatAnalyzer> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            analyzer: Arc::clone(&self.analyzer),
            store: Arc::clone(&self.store),
            base_dir: Arc::clone(&self.base_dir),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all non-validation error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "missing_file", "analysis_failed")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    pub status: u16,
}

impl ErrorResponse {
    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: status.as_u16(),
        }
    }
}

/// Body returned when the upload form fails validation.
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    /// Always "error"
    pub status: &'static str,

    /// Messages keyed by field name
    pub errors: FormErrors,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Name of the configured analyzer
    pub analyzer: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Log an error by severity and build its JSON response.
///
/// - 4xx errors are logged at WARN level (client errors)
/// - 5xx errors are logged at ERROR level (server errors)
fn error_response(status: StatusCode, error_type: &str, message: String) -> Response {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            message
        );
    } else if status.is_client_error() {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            message
        );
    }

    let body = ErrorResponse::with_status(error_type, message, status);
    (status, Json(body)).into_response()
}

/// Convert AnalysisError to HTTP response.
///
/// Every analyzer failure is a server error, including a missing dataset:
/// the caller never chooses the path, so a missing file is a deployment fault.
impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let error_type = match &self {
            AnalysisError::DatasetNotFound(_) => "dataset_not_found",
            AnalysisError::Timeout(_) => "analysis_timeout",
            _ => "analysis_failed",
        };
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_type,
            self.to_string(),
        )
    }
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "storage_error",
            self.to_string(),
        )
    }
}

/// Convert UploadError to HTTP response.
///
/// A request without `csv_file` is reported as a server error, not a
/// validation failure: the form is never built without its file.
impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::Multipart { status, message } => {
                error_response(status, "invalid_multipart", message)
            }
            UploadError::MissingFile(field) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "missing_file",
                format!("No file uploaded under '{}'", field),
            ),
            UploadError::Storage(err) => err.into_response(),
            UploadError::Analysis(err) => err.into_response(),
        }
    }
}

impl IntoResponse for FormErrors {
    fn into_response(self) -> Response {
        warn!(
            status = StatusCode::BAD_REQUEST.as_u16(),
            fields = ?self.fields().collect::<Vec<_>>(),
            "Upload form rejected"
        );
        let body = ValidationErrorResponse {
            status: "error",
            errors: self,
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Errors from the upload-and-analyze endpoint.
#[derive(Debug)]
pub enum ModelPageError {
    /// The form failed validation (400)
    Invalid(FormErrors),

    /// Reading, storing or analyzing the upload failed
    Upload(UploadError),
}

impl IntoResponse for ModelPageError {
    fn into_response(self) -> Response {
        match self {
            ModelPageError::Invalid(errors) => errors.into_response(),
            ModelPageError::Upload(err) => err.into_response(),
        }
    }
}

impl From<UploadError> for ModelPageError {
    fn from(err: UploadError) -> Self {
        ModelPageError::Upload(err)
    }
}

impl From<FormErrors> for ModelPageError {
    fn from(errors: FormErrors) -> Self {
        ModelPageError::Invalid(errors)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle the landing page.
///
/// # Endpoint
///
/// `GET /`
///
/// # Response
///
/// `200 OK` with an HTML link to `model_page/`.
pub async fn home_handler() -> Html<&'static str> {
    Html(HOME_PAGE_HTML)
}

/// Handle CSV uploads.
///
/// # Endpoint
///
/// `POST /model_page/` with `multipart/form-data`
///
/// # Form Fields
///
/// - `csv_file`: the CSV file (required)
/// - `report_name`: report title (required, at most 100 characters)
/// - `notes`: free text (optional, at most 1000 characters)
///
/// # Response
///
/// - `200 OK`: the analyzer's JSON output for the stored file
/// - `400 Bad Request`: `{"status": "error", "errors": {...}}` or malformed multipart
/// - `413 Payload Too Large`: body exceeds the configured upload limit
/// - `500 Internal Server Error`: no `csv_file`, storage or analysis failure
pub async fn model_page_handler<A: ThreatAnalyzer>(
    State(state): State<AppState<A>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ModelPageError> {
    let submission = read_submission(&mut multipart).await?;
    let form = submission.into_form()?;
    let report = form.validate()?;

    let stored = state
        .store
        .save(&report.csv_file)
        .await
        .map_err(UploadError::from)?;

    info!(
        report_name = %report.report_name,
        path = %stored.path.display(),
        sha256 = %stored.sha256,
        "Analyzing uploaded report"
    );

    let threat_data = run_analysis(state.analyzer.as_ref(), &stored.path)
        .await
        .map_err(UploadError::from)?;

    Ok(Json(threat_data))
}

/// Handle the clean sample dataset.
///
/// # Endpoint
///
/// `GET /clean_dataset_page/`
///
/// # Response
///
/// - `200 OK`: the analyzer's JSON output for `<base_dir>/clean_dataset.csv`
/// - `500 Internal Server Error`: dataset missing or analysis failure
pub async fn clean_dataset_handler<A: ThreatAnalyzer>(
    State(state): State<AppState<A>>,
) -> Result<Json<Value>, AnalysisError> {
    analyze_dataset(&state, SampleDataset::Clean).await
}

/// Handle the dirty sample dataset.
///
/// # Endpoint
///
/// `GET /dirty_dataset_page/`
///
/// # Response
///
/// - `200 OK`: the analyzer's JSON output for `<base_dir>/dirty_dataset.csv`
/// - `500 Internal Server Error`: dataset missing or analysis failure
pub async fn dirty_dataset_handler<A: ThreatAnalyzer>(
    State(state): State<AppState<A>>,
) -> Result<Json<Value>, AnalysisError> {
    analyze_dataset(&state, SampleDataset::Dirty).await
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "analyzer": "heuristic"
/// }
/// ```
pub async fn health_handler<A: ThreatAnalyzer>(
    State(state): State<AppState<A>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        analyzer: state.analyzer.name().to_string(),
    })
}

async fn analyze_dataset<A: ThreatAnalyzer>(
    state: &AppState<A>,
    dataset: SampleDataset,
) -> Result<Json<Value>, AnalysisError> {
    let path = state.dataset_path(dataset);
    info!(dataset = %dataset, path = %path.display(), "Analyzing sample dataset");
    let threat_data = run_analysis(state.analyzer.as_ref(), &path).await?;
    Ok(Json(threat_data))
}

async fn run_analysis<A: ThreatAnalyzer>(
    analyzer: &A,
    path: &std::path::Path,
) -> Result<Value, AnalysisError> {
    let started = Instant::now();
    let result = analyzer.analyze(path).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    // Failures are logged once, when mapped to a response
    if result.is_ok() {
        info!(
            analyzer = analyzer.name(),
            elapsed_ms = elapsed_ms,
            "Analysis complete"
        );
    }

    result
}

// =============================================================================
// Tests
// =============================================================================
