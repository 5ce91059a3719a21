mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

async fn json_body(response: axum::response::Response) -> Result<Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn agent_routes_require_a_session() -> Result<()> {
    let app = common::test_app();

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/properties")
                .body(Body::empty())
                .unwrap(),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(res).await?;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn garbage_bearer_token_is_rejected() -> Result<()> {
    let app = common::test_app();

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/whoami")
                .header("authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(res).await?;
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn token_signed_with_wrong_secret_is_rejected() -> Result<()> {
    let app = common::test_app();

    let claims = estate_api_rust::auth::SessionClaims::new("user-1", "agent@example.com");
    let token = estate_api_rust::auth::issue_session_token(&claims, "some-other-secret")
        .map_err(anyhow::Error::msg)?;

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/whoami")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn public_search_rejects_non_positive_page() -> Result<()> {
    let app = common::test_app();

    let res = app
        .oneshot(
            Request::builder()
                .uri("/properties?page=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = json_body(res).await?;
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn public_search_rejects_non_positive_limit() -> Result<()> {
    let app = common::test_app();

    let res = app
        .oneshot(
            Request::builder()
                .uri("/properties?limit=-5")
                .body(Body::empty())
                .unwrap(),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
