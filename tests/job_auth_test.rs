mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn job_endpoints_require_the_shared_secret() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post_job_with_secret("/api/v1/jobs/expiry-sweep", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post_job_with_secret("/api/v1/jobs/expiry-sweep", Some("wrong-secret"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post_job("/api/v1/jobs/expiry-sweep").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn offer_step_and_scoring_share_the_guard() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post_job_with_secret("/api/v1/jobs/offer-step/any", Some("wrong-secret"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post_job_with_secret("/api/v1/jobs/reliability-scoring/any", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_server_secret_is_a_configuration_error() {
    let app = TestApp::with_secret(None).await;

    let (status, body) = app
        .post_job_with_secret("/api/v1/jobs/expiry-sweep", Some("anything"))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Missing configuration"));
}
