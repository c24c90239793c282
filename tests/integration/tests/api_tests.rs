//! API Integration Tests
//!
//! These tests run the full application (routes + middleware + pool)
//! against an unreachable database and exercise the fail-closed paths:
//! health reporting, input validation, and the error envelope.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use integration_tests::TestServer;
use reqwest::StatusCode;
use serde_json::{json, Value};

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn health_reports_unavailable_without_database() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/health").await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "unavailable");
    assert_eq!(body["dbConnected"], false);
    assert_eq!(body["pool"]["maxSize"], 2);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/health").await.expect("Request failed");
    assert!(response.headers().contains_key("x-request-id"));
}

// ============================================================================
// Validation (must fail before any connection is acquired)
// ============================================================================

#[tokio::test]
async fn transfer_with_equal_departments_is_rejected() {
    let server = TestServer::start().await.expect("Failed to start server");

    let body = json!({
        "source_department": "d005",
        "target_department": "d005",
        "limit": 10
    });
    let response = server
        .post("/api/v1/employees/transfer", &body)
        .await
        .expect("Request failed");

    // With the database down, an acquire attempt would yield 500; a 400
    // proves validation ran before any connection was touched.
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].as_str().unwrap().contains("must differ"));
}

#[tokio::test]
async fn transfer_with_missing_fields_is_rejected() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post("/api/v1/employees/transfer", &json!({}))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn transfer_with_out_of_range_limit_is_rejected() {
    let server = TestServer::start().await.expect("Failed to start server");

    let body = json!({
        "source_department": "d005",
        "target_department": "d001",
        "limit": 100_000
    });
    let response = server
        .post("/api/v1/employees/transfer", &body)
        .await
        .expect("Request failed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn salary_adjustment_requires_a_positive_amount() {
    let server = TestServer::start().await.expect("Failed to start server");

    let body = json!({ "employee_id": 10_001, "amount": 0 });
    let response = server
        .put("/api/v1/salaries/adjust", &body)
        .await
        .expect("Request failed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// ============================================================================
// Error envelope
// ============================================================================

#[tokio::test]
async fn query_endpoints_fail_closed_when_database_is_down() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .get("/api/v1/employees")
        .await
        .expect("Request failed");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "CONNECTION_LOST");
    assert_eq!(body["retryable"], true);
    // No connection details may leak into the error body
    assert!(!body["error"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn unknown_routes_return_404() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .get("/api/v1/does-not-exist")
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
