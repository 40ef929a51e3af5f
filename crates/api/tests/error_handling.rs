//! Tests for `AppError` -> HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use csvtx_api::error::AppError;
use csvtx_core::error::CoreError;
use csvtx_supervisor::JobError;
use http_body_util::BodyExt;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
    (status, json)
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("target_columns: empty".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "target_columns: empty");
}

#[tokio::test]
async fn invalid_job_options_return_400() {
    let err = AppError::from(JobError::InvalidOptions(CoreError::Validation(
        "input_path: must not be empty".into(),
    )));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn already_running_returns_409() {
    let err = AppError::from(JobError::AlreadyRunning { job_id: 7 });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "JOB_RUNNING");
    assert!(json["error"].as_str().is_some_and(|e| e.contains("job 7")));
}

#[tokio::test]
async fn spawn_error_returns_500_with_message() {
    let err = AppError::from(JobError::Spawn {
        message: "python3: No such file or directory (os error 2)".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "SPAWN_ERROR");
    assert!(json["error"]
        .as_str()
        .is_some_and(|e| e.contains("No such file or directory")));
}

#[tokio::test]
async fn aborted_job_hides_details() {
    let err = AppError::Job(JobError::Aborted("task 7 panicked: secret detail".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn bad_request_returns_400() {
    let err = AppError::BadRequest("path is required".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "path is required");
}
