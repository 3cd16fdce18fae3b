//! # RiskLens
//!
//! A small HTTP service that accepts CSV activity logs, stores them, and
//! returns a threat analysis as JSON.
//!
//! ## Features
//!
//! - **Upload and analyze**: multipart CSV upload with form validation
//! - **Sample datasets**: fixed endpoints for bundled clean and dirty datasets
//! - **Pluggable analysis**: built-in CSV heuristic or any external program that prints JSON
//! - **Durable storage**: uploads are kept under a media directory, never overwritten
//!
//! ## Architecture
//!
//! - [`analysis`] - The `ThreatAnalyzer` seam and its implementations
//! - [`upload`] - Multipart parsing, form validation and upload storage
//! - [`dataset`] - Paths of the bundled sample datasets
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use risklens::{create_router, HeuristicAnalyzer, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RouterConfig::new(".", "media");
//!     let router = create_router(HeuristicAnalyzer::new(), config);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod dataset;
pub mod error;
pub mod server;
pub mod upload;

// Re-export commonly used types
pub use analysis::{CommandAnalyzer, HeuristicAnalyzer, ThreatAnalyzer};
pub use config::{AnalyzeConfig, AnalyzerArgs, AnalyzerKind, Cli, Command, ServeConfig};
pub use dataset::{SampleDataset, CLEAN_DATASET_FILE, DIRTY_DATASET_FILE};
pub use error::{AnalysisError, StorageError, UploadError};
pub use server::{
    create_router, AppState, ErrorResponse, HealthResponse, ModelPageError, RouterConfig,
    ValidationErrorResponse, HOME_PAGE_HTML,
};
pub use upload::{
    FormErrors, StoredUpload, ThreatReport, ThreatReportForm, UploadStore, UploadedFile,
    CSV_FILE_FIELD,
};
