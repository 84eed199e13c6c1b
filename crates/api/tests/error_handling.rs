//! Tests for `ApiError` -> HTTP response mapping.
//!
//! These verify that each error variant produces the correct HTTP status
//! code, error code, and message. They do not need an HTTP server -- they
//! call `IntoResponse` directly on `ApiError` values.

use axum::response::IntoResponse;
use http_body_util::BodyExt;

use atelier_api::error::ApiError;
use atelier_core::error::CoreError;
use atelier_store::StoreError;

/// Helper: convert an `ApiError` into its status code and parsed JSON body.
async fn error_to_response(err: ApiError) -> (axum::http::StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: CoreError::NotFound maps to 404 with NOT_FOUND code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = ApiError::Core(CoreError::NotFound {
        entity: "Project",
        id: uuid::Uuid::new_v4(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Project not found");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Unauthorized maps to 401
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_error_returns_401() {
    let err = ApiError::Core(CoreError::Unauthorized("Invalid or expired token".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(json["error"], "Invalid or expired token");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Forbidden maps to 403
// ---------------------------------------------------------------------------

#[tokio::test]
async fn forbidden_error_returns_403() {
    let err = ApiError::Core(CoreError::Forbidden("Not authorized".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
    assert_eq!(json["error"], "Not authorized");
}

// ---------------------------------------------------------------------------
// Test: CoreError::InvalidInput maps to 400
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_input_error_returns_400() {
    let err = ApiError::Core(CoreError::InvalidInput("Invalid status".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_INPUT");
    assert_eq!(json["error"], "Invalid status");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Conflict maps to 409
// ---------------------------------------------------------------------------

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = ApiError::Core(CoreError::Conflict("User already exists".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "User already exists");
}

// ---------------------------------------------------------------------------
// Test: StoreError::NotFound maps to 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_not_found_returns_404() {
    let err = ApiError::Store(StoreError::NotFound { entity: "Project" });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Project not found");
}

// ---------------------------------------------------------------------------
// Test: StoreError::Backend maps to a sanitized 500
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_backend_failure_returns_sanitized_500() {
    let err = ApiError::Store(StoreError::Backend(
        "connection refused at 10.0.0.3:5432".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "STORE_FAILURE");
    // The backend detail must not leak to the caller.
    assert_eq!(json["error"], "A storage error occurred");
}

// ---------------------------------------------------------------------------
// Test: ApiError::Internal maps to a sanitized 500
// ---------------------------------------------------------------------------

#[tokio::test]
async fn internal_error_returns_sanitized_500() {
    let err = ApiError::Internal("password hashing failed: out of entropy".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}
