//! Test utilities for integration tests.
//!
//! This module provides mock analyzers, multipart body builders and a router
//! fixture backed by temporary directories.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::RwLock;

use risklens::error::AnalysisError;
use risklens::{
    create_router, RouterConfig, ThreatAnalyzer, CLEAN_DATASET_FILE, DIRTY_DATASET_FILE,
};

/// Multipart boundary used by [`MultipartBuilder`].
pub const BOUNDARY: &str = "risklens-test-boundary";

/// A small valid activity log.
pub const SAMPLE_CSV: &str = "\
timestamp,user_id,event_type,status,label
2024-01-01T08:00:00,alice,login,failed,1
2024-01-01T09:00:00,bob,file_read,success,0
";

// =============================================================================
// Mock Analyzers
// =============================================================================

/// An analyzer that records every path it is given and echoes it back.
///
/// Returns `{"csv_path": <path>, "analyzed": true}`.
#[derive(Clone, Default)]
pub struct RecordingAnalyzer {
    calls: Arc<RwLock<Vec<PathBuf>>>,
}

impl RecordingAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<PathBuf> {
        self.calls.read().await.clone()
    }

    /// The JSON this analyzer returns for `path`.
    pub fn expected_output(path: &Path) -> Value {
        json!({
            "csv_path": path.to_string_lossy(),
            "analyzed": true,
        })
    }
}

#[async_trait]
impl ThreatAnalyzer for RecordingAnalyzer {
    async fn analyze(&self, csv_path: &Path) -> Result<Value, AnalysisError> {
        self.calls.write().await.push(csv_path.to_path_buf());
        if !csv_path.exists() {
            return Err(AnalysisError::DatasetNotFound(csv_path.to_path_buf()));
        }
        Ok(Self::expected_output(csv_path))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// An analyzer that always fails.
#[derive(Clone, Default)]
pub struct FailingAnalyzer {
    calls: Arc<AtomicUsize>,
}

impl FailingAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThreatAnalyzer for FailingAnalyzer {
    async fn analyze(&self, _csv_path: &Path) -> Result<Value, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AnalysisError::CommandFailed {
            status: "exit status: 1".to_string(),
            stderr: "model crashed".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

// =============================================================================
// Router Fixture
// =============================================================================

/// Temporary base and media directories plus the router serving them.
pub struct TestApp {
    pub router: Router,
    pub base_dir: TempDir,
    pub media_dir: TempDir,
}

impl TestApp {
    /// Build a router whose base directory holds both sample datasets.
    pub fn new<A: ThreatAnalyzer>(analyzer: A) -> Self {
        Self::with_config(analyzer, |config| config)
    }

    /// Build a router, letting the caller adjust the configuration.
    pub fn with_config<A, F>(analyzer: A, configure: F) -> Self
    where
        A: ThreatAnalyzer,
        F: FnOnce(RouterConfig) -> RouterConfig,
    {
        let base_dir = tempfile::tempdir().unwrap();
        let media_dir = tempfile::tempdir().unwrap();
        std::fs::write(base_dir.path().join(CLEAN_DATASET_FILE), SAMPLE_CSV).unwrap();
        std::fs::write(base_dir.path().join(DIRTY_DATASET_FILE), SAMPLE_CSV).unwrap();

        let config = configure(RouterConfig::new(base_dir.path(), media_dir.path()));
        let router = create_router(analyzer, config);

        Self {
            router,
            base_dir,
            media_dir,
        }
    }

    /// Directory uploads are written to.
    pub fn upload_dir(&self) -> PathBuf {
        self.media_dir.path().join(risklens::upload::UPLOAD_SUBDIR)
    }

    /// Names of all stored uploads, sorted.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(self.upload_dir()) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

// =============================================================================
// Multipart Bodies
// =============================================================================

/// Builds `multipart/form-data` request bodies.
#[derive(Default)]
pub struct MultipartBuilder {
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/csv\r\n\r\n",
                BOUNDARY, name, file_name
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }

    /// Build a `POST` request to `uri` carrying this body.
    pub fn request(self, uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(self.build()))
            .unwrap()
    }
}

/// A complete, valid upload of [`SAMPLE_CSV`].
pub fn valid_upload() -> MultipartBuilder {
    MultipartBuilder::new()
        .text("report_name", "Weekly review")
        .file("csv_file", "events.csv", SAMPLE_CSV.as_bytes())
}

// =============================================================================
// Response Helpers
// =============================================================================

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
