//! Test application setup utilities
//!
//! Spins up the application router against a per-test SQLite file and a
//! per-test audit trail file, both inside a temporary directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{body::Body, http::Request, routing::get, Router};
use tempfile::TempDir;
use tower::ServiceExt;

use doorlog::{api, db, AppConfig, AppState, AuditTrail};

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    // Holds the temp directory open for the lifetime of the test
    _tmp: TempDir,
}

impl TestApp {
    /// Create a new test application backed by temporary files
    pub async fn new() -> Self {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let config = test_config(tmp.path());
        Self::with_config(config, tmp).await
    }

    /// Create a test application whose audit trail points at an unwritable
    /// location, to exercise best-effort append behavior
    pub async fn with_broken_audit_trail() -> Self {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let mut config = test_config(tmp.path());
        config.audit.log_file = PathBuf::from("/nonexistent-dir/system_events.log");
        Self::with_config(config, tmp).await
    }

    async fn with_config(config: AppConfig, tmp: TempDir) -> Self {
        let db = db::init_pool(&config.database)
            .await
            .expect("Failed to initialize test database");

        let audit = Arc::new(AuditTrail::new(config.audit.log_file.clone()));

        let state = AppState { config, db, audit };

        let router = Router::new()
            .route("/", get(api::root))
            .nest("/api", api::routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _tmp: tmp,
        }
    }

    /// Read the audit trail file; empty string if nothing was written yet
    pub fn audit_trail_contents(&self) -> String {
        std::fs::read_to_string(&self.state.config.audit.log_file).unwrap_or_default()
    }

    /// Make a GET request to the test application
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.json_request("POST", uri, body).await
    }

    /// Make a PUT request with JSON body
    pub async fn put_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.json_request("PUT", uri, body).await
    }

    /// Make a PATCH request with JSON body
    pub async fn patch_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.json_request("PATCH", uri, body).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn json_request(&self, method: &str, uri: &str, body: serde_json::Value) -> TestResponse {
        self.request(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make an arbitrary request
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub body: bytes::Bytes,
}

impl TestResponse {
    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    /// Assert the response status
    pub fn assert_status(&self, expected: axum::http::StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert the response status is OK (200)
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::OK)
    }

    /// Assert the response status is Created (201)
    pub fn assert_created(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::CREATED)
    }

    /// Assert the response status is No Content (204)
    pub fn assert_no_content(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::NO_CONTENT)
    }

    /// Assert the response status is Bad Request (400)
    pub fn assert_bad_request(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::BAD_REQUEST)
    }

    /// Assert the response status is Not Found (404)
    pub fn assert_not_found(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::NOT_FOUND)
    }
}

/// Create a test configuration rooted in the given temp directory
fn test_config(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = format!(
        "sqlite://{}?mode=rwc",
        dir.join("doorlog_test.db").display()
    );
    config.database.max_connections = 1;
    config.audit.log_file = dir.join("system_events.log");
    config
}
