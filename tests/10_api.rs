//! HTTP surface smoke tests: routing, the auth middleware, and the success
//! envelope, driven through the router in-process.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use surat_api::auth::issue_token;
use surat_api::database::models::SubmissionKind;
use surat_api::handlers::{app, AppState};
use surat_api::services::submission::{CreateSubmission, SubmissionService};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_needs_no_token() {
    let fx = common::setup().await;
    let app = app(AppState::new(fx.store.clone()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_reject_missing_tokens() {
    let fx = common::setup().await;
    let app = app(AppState::new(fx.store.clone()));

    let response = app
        .oneshot(Request::builder().uri("/api/letters").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn issued_tokens_pass_the_middleware() {
    let fx = common::setup().await;
    let app = app(AppState::new(fx.store.clone()));
    let token = issue_token(&fx.admin()).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/institutions")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], Value::Bool(true));
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn signatory_page_resolves_by_token_without_auth() {
    let fx = common::setup().await;
    let created = SubmissionService::new(fx.store.clone())
        .create(
            &fx.student(),
            SubmissionKind::Student,
            CreateSubmission {
                letter_id: fx.plain_letter,
                name: "Pengantar".to_string(),
                attributes: vec![],
                documents: vec![],
                carbon_copy: None,
            },
        )
        .await
        .unwrap();

    let app = app(AppState::new(fx.store.clone()));
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/letters/{}", created.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["letterName"], Value::String("Surat Pengantar".to_string()));
    // The public view never carries signature tokens or codes.
    assert!(body["data"]["signatures"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s.get("token").is_none() && s.get("code").is_none()));
}

#[tokio::test]
async fn unknown_letter_tokens_are_not_found() {
    let fx = common::setup().await;
    let app = app(AppState::new(fx.store.clone()));

    let response = app
        .oneshot(Request::builder().uri("/letters/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"], Value::Bool(true));
    assert_eq!(body["code"], Value::String("NOT_FOUND".to_string()));
}
