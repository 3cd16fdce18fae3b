//! Router configuration for RiskLens.
//!
//! This module defines the HTTP routes and applies middleware for CORS,
//! request body limits and tracing.
//!
//! # Route Structure
//!
//! ```text
//! /                       - Landing link (GET)
//! /model_page/            - Upload and analyze a CSV (POST, multipart)
//! /clean_dataset_page/    - Analyze the clean sample dataset (GET)
//! /dirty_dataset_page/    - Analyze the dirty sample dataset (GET)
//! /health                 - Health check (GET)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use risklens::analysis::HeuristicAnalyzer;
//! use risklens::server::routes::{create_router, RouterConfig};
//!
//! let config = RouterConfig::new("datasets", "media")
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(HeuristicAnalyzer::new(), config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    clean_dataset_handler, dirty_dataset_handler, health_handler, home_handler,
    model_page_handler, AppState,
};
use crate::analysis::ThreatAnalyzer;
use crate::config::{DEFAULT_BASE_DIR, DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_MEDIA_DIR};
use crate::upload::UploadStore;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Directory holding the sample datasets
    pub base_dir: PathBuf,

    /// Root directory for stored uploads
    pub media_dir: PathBuf,

    /// Maximum request body size in bytes
    pub max_upload_size: usize,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Uploads are limited to 10 MiB
    /// - Tracing is enabled
    pub fn new(base_dir: impl Into<PathBuf>, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            media_dir: media_dir.into(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            cors_origins: None, // Allow any origin by default
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set the maximum request body size in bytes.
    pub fn with_max_upload_size(mut self, bytes: usize) -> Self {
        self.max_upload_size = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DIR, DEFAULT_MEDIA_DIR)
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - The landing page, upload endpoint and sample dataset endpoints
/// - A health check
/// - Request body limit
/// - CORS configuration
/// - Request tracing (optional)
///
/// # Arguments
///
/// * `analyzer` - The analysis function every endpoint delegates to
/// * `config` - Router configuration
///
/// # Returns
///
/// A configured Axum router ready to be served.
pub fn create_router<A>(analyzer: A, config: RouterConfig) -> Router
where
    A: ThreatAnalyzer,
{
    let store = UploadStore::new(&config.media_dir);
    let app_state = AppState::new(analyzer, store, &config.base_dir);

    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/", get(home_handler))
        .route("/model_page/", post(model_page_handler::<A>))
        .route("/clean_dataset_page/", get(clean_dataset_handler::<A>))
        .route("/dirty_dataset_page/", get(dirty_dataset_handler::<A>))
        .route("/health", get(health_handler::<A>))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_upload_size))
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
