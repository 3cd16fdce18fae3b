//! Upload integration tests.
//!
//! Tests verify:
//! - A valid upload is stored and its path handed to the analyzer
//! - Form validation failures return 400 with per-field errors
//! - A request without `csv_file` is a server error
//! - Analyzer failures and oversized bodies

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use super::test_utils::{
    body_json, valid_upload, FailingAnalyzer, MultipartBuilder, RecordingAnalyzer, TestApp,
    SAMPLE_CSV,
};

// =============================================================================
// Successful Uploads
// =============================================================================

#[tokio::test]
async fn test_upload_returns_analyzer_output_for_stored_file() {
    let analyzer = RecordingAnalyzer::new();
    let app = TestApp::new(analyzer.clone());

    let response = app
        .router
        .clone()
        .oneshot(valid_upload().request("/model_page/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let calls = analyzer.calls().await;
    assert_eq!(calls.len(), 1);
    let stored_path = &calls[0];
    assert_eq!(stored_path, &app.upload_dir().join("events.csv"));

    // The body is exactly what the analyzer returned for the stored path
    let json = body_json(response).await;
    assert_eq!(json, RecordingAnalyzer::expected_output(stored_path));

    // The upload was persisted byte for byte
    assert_eq!(std::fs::read_to_string(stored_path).unwrap(), SAMPLE_CSV);
}

#[tokio::test]
async fn test_upload_with_optional_notes() {
    let analyzer = RecordingAnalyzer::new();
    let app = TestApp::new(analyzer.clone());

    let request = valid_upload()
        .text("notes", "exported from the SIEM")
        .request("/model_page/");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(analyzer.calls().await.len(), 1);
}

#[tokio::test]
async fn test_repeated_upload_does_not_overwrite() {
    let analyzer = RecordingAnalyzer::new();
    let app = TestApp::new(analyzer.clone());

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(valid_upload().request("/model_page/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let calls = analyzer.calls().await;
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0], calls[1]);

    let stored = app.stored_files();
    assert_eq!(stored.len(), 2);
    assert!(stored.contains(&"events.csv".to_string()));
}

#[tokio::test]
async fn test_upload_file_name_is_sanitized() {
    let analyzer = RecordingAnalyzer::new();
    let app = TestApp::new(analyzer.clone());

    let request = MultipartBuilder::new()
        .text("report_name", "r")
        .file("csv_file", "../../weekly events.csv", SAMPLE_CSV.as_bytes())
        .request("/model_page/");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.stored_files(), vec!["weekly_events.csv".to_string()]);
}

// =============================================================================
// Validation Failures
// =============================================================================

#[tokio::test]
async fn test_missing_required_field_returns_form_errors() {
    let analyzer = RecordingAnalyzer::new();
    let app = TestApp::new(analyzer.clone());

    let request = MultipartBuilder::new()
        .file("csv_file", "events.csv", SAMPLE_CSV.as_bytes())
        .request("/model_page/");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
    let errors = json["errors"].as_object().unwrap();
    assert!(!errors.is_empty());
    assert_eq!(errors["report_name"][0], "This field is required.");

    // Nothing stored, nothing analyzed
    assert!(analyzer.calls().await.is_empty());
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_empty_file_returns_form_errors() {
    let analyzer = RecordingAnalyzer::new();
    let app = TestApp::new(analyzer.clone());

    let request = MultipartBuilder::new()
        .text("report_name", "r")
        .file("csv_file", "events.xlsx", b"")
        .request("/model_page/");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // An empty file stops validation before the extension is checked
    let json = body_json(response).await;
    let messages = json["errors"]["csv_file"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0], "The submitted file is empty.");
    assert!(analyzer.calls().await.is_empty());
}

#[tokio::test]
async fn test_wrong_extension_returns_form_errors() {
    let analyzer = RecordingAnalyzer::new();
    let app = TestApp::new(analyzer.clone());

    let request = MultipartBuilder::new()
        .text("report_name", "r")
        .file("csv_file", "events.xlsx", SAMPLE_CSV.as_bytes())
        .request("/model_page/");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    let messages = json["errors"]["csv_file"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].as_str().unwrap().contains("“xlsx”"));
    assert!(analyzer.calls().await.is_empty());
}

#[tokio::test]
async fn test_too_long_report_name() {
    let app = TestApp::new(RecordingAnalyzer::new());

    let name = "x".repeat(101);
    let request = MultipartBuilder::new()
        .text("report_name", &name)
        .file("csv_file", "events.csv", SAMPLE_CSV.as_bytes())
        .request("/model_page/");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(
        json["errors"]["report_name"][0],
        "Ensure this value has at most 100 characters (it has 101)."
    );
}

// =============================================================================
// Missing File
// =============================================================================

#[tokio::test]
async fn test_missing_file_is_server_error() {
    let analyzer = RecordingAnalyzer::new();
    let app = TestApp::new(analyzer.clone());

    let request = MultipartBuilder::new()
        .text("report_name", "r")
        .request("/model_page/");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], "missing_file");
    assert_eq!(json["status"], 500);
    assert!(analyzer.calls().await.is_empty());
}

#[tokio::test]
async fn test_missing_file_checked_before_form_validation() {
    let app = TestApp::new(RecordingAnalyzer::new());

    // Invalid form AND no file: the missing file wins
    let request = MultipartBuilder::new()
        .text("notes", "no name, no file")
        .request("/model_page/");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_file_part_without_file_name_is_missing_file() {
    let analyzer = RecordingAnalyzer::new();
    let app = TestApp::new(analyzer.clone());

    // What a browser sends when no file was chosen
    let request = MultipartBuilder::new()
        .text("report_name", "r")
        .file("csv_file", "", b"")
        .request("/model_page/");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "missing_file");
    assert!(analyzer.calls().await.is_empty());
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_csv_file_sent_as_text_is_missing_file() {
    let app = TestApp::new(RecordingAnalyzer::new());

    let request = MultipartBuilder::new()
        .text("report_name", "r")
        .text("csv_file", SAMPLE_CSV)
        .request("/model_page/");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_non_multipart_body_rejected() {
    let analyzer = RecordingAnalyzer::new();
    let app = TestApp::new(analyzer.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/model_page/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
    assert!(analyzer.calls().await.is_empty());
}

// =============================================================================
// Analyzer and Limit Failures
// =============================================================================

#[tokio::test]
async fn test_analyzer_failure_is_server_error() {
    let analyzer = FailingAnalyzer::new();
    let app = TestApp::new(analyzer.clone());

    let response = app
        .router
        .clone()
        .oneshot(valid_upload().request("/model_page/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], "analysis_failed");
    assert!(json["message"].as_str().unwrap().contains("model crashed"));
    assert_eq!(analyzer.call_count(), 1);

    // The upload was stored before the analyzer ran and is kept
    assert_eq!(app.stored_files(), vec!["events.csv".to_string()]);
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let analyzer = RecordingAnalyzer::new();
    let app = TestApp::with_config(analyzer.clone(), |config| {
        config.with_max_upload_size(1024)
    });

    let big = "user_id,event_type\n".to_string() + &"u1,login\n".repeat(1000);
    let request = MultipartBuilder::new()
        .text("report_name", "r")
        .file("csv_file", "big.csv", big.as_bytes())
        .request("/model_page/");

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(analyzer.calls().await.is_empty());
    assert!(app.stored_files().is_empty());
}
