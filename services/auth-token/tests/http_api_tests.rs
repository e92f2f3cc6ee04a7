//! HTTP API tests driving the router in-process.

use auth_token::http::{self, AppState, ErrorResponse, HealthResponse};
use auth_token::refresh::{RefreshTokenHasher, RefreshTokenRotator};
use auth_token::storage::{provision_users, InMemoryStore, User};
use auth_token::{Config, SigningKey, StoreBackend, TokenIssuer, TokenPair, TokenTtls};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use proptest::prelude::*;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use test_utils::fixtures::{
    SCENARIO_CLIENT_IP, SCENARIO_USER_EMAIL, SCENARIO_USER_GUID, TEST_SIGNING_KEY_B64,
    UNKNOWN_USER_GUID,
};
use test_utils::generators::non_guid_strategy;
use tower::ServiceExt;

async fn app() -> Router {
    let store = Arc::new(InMemoryStore::new());
    store
        .insert_user(User::new(SCENARIO_USER_GUID, SCENARIO_USER_EMAIL))
        .await;
    app_with_store(store)
}

fn app_with_store(store: Arc<InMemoryStore>) -> Router {
    let key = Arc::new(SigningKey::from_base64(TEST_SIGNING_KEY_B64).unwrap());
    let issuer = Arc::new(
        TokenIssuer::new(store.clone(), key, TokenTtls::default())
            .with_hasher(RefreshTokenHasher::minimal()),
    );
    let rotator = Arc::new(RefreshTokenRotator::new(store, issuer.clone()));
    http::router(AppState::new(issuer, rotator))
}

fn access_request(guid: &str, forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::GET)
        .uri(format!("/access/{}", guid));
    if let Some(ip) = forwarded_for {
        builder = builder.header("X-Forwarded-For", ip);
    }
    builder.body(Body::empty()).unwrap()
}

fn refresh_request(body: String, forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/refresh")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(ip) = forwarded_for {
        builder = builder.header("X-Forwarded-For", ip);
    }
    builder.body(Body::from(body)).unwrap()
}

fn refresh_body(pair: &TokenPair) -> String {
    serde_json::to_string(pair).unwrap()
}

async fn json<T: DeserializeOwned>(response: Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn issue(app: &Router) -> TokenPair {
    let response = app
        .clone()
        .oneshot(access_request(SCENARIO_USER_GUID, Some(SCENARIO_CLIENT_IP)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json(response).await
}

#[tokio::test]
async fn test_access_returns_pair() {
    let app = app().await;
    let pair = issue(&app).await;

    assert_eq!(pair.access_token.split('.').count(), 3);
    assert_eq!(pair.refresh_token.len(), 44);
}

#[tokio::test]
async fn test_access_uses_first_forwarded_address() {
    let app = app().await;
    let response = app
        .oneshot(access_request(
            SCENARIO_USER_GUID,
            Some("198.51.100.7, 10.0.0.1"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_access_bad_requests() {
    let app = app().await;

    for request in [
        access_request("not-a-guid", Some(SCENARIO_CLIENT_IP)),
        access_request(SCENARIO_USER_GUID, None),
        access_request(SCENARIO_USER_GUID, Some("not-an-ip")),
    ] {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = json(response).await;
        assert_eq!(body.error.code, "BAD_REQUEST");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_access_rejects_non_guid(guid in non_guid_strategy()) {
        tokio_test::block_on(async {
            let app = app().await;
            let response = app
                .oneshot(access_request(&guid, Some(SCENARIO_CLIENT_IP)))
                .await
                .unwrap();
            prop_assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body: ErrorResponse = json(response).await;
            prop_assert_eq!(body.error.code, "BAD_REQUEST");
            Ok(())
        })?;
    }
}

#[tokio::test]
async fn test_seeded_memory_store_issues_tokens() {
    let seeded = "33333333-3333-3333-3333-333333333333";
    std::env::set_var("STORE_BACKEND", "memory");
    std::env::set_var("SEED_USERS", format!("{}=seeded@example.com", seeded));
    let config = Config::from_env().unwrap();
    std::env::remove_var("STORE_BACKEND");
    std::env::remove_var("SEED_USERS");
    assert_eq!(config.store_backend, StoreBackend::Memory);

    let store = Arc::new(InMemoryStore::new());
    provision_users(store.as_ref(), &config.seed_users)
        .await
        .unwrap();
    let app = app_with_store(store);

    let response = app
        .clone()
        .oneshot(access_request(seeded, Some(SCENARIO_CLIENT_IP)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pair: TokenPair = json(response).await;
    assert_eq!(pair.refresh_token.len(), 44);

    // Only seeded users exist.
    let response = app
        .oneshot(access_request(SCENARIO_USER_GUID, Some(SCENARIO_CLIENT_IP)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_unknown_user_unauthorized() {
    let app = app().await;
    let response = app
        .oneshot(access_request(UNKNOWN_USER_GUID, Some(SCENARIO_CLIENT_IP)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = json(response).await;
    assert_eq!(body.error.code, "UNAUTHORIZED");
}

#[tokio::test]
async fn test_refresh_rotates_once() {
    let app = app().await;
    let pair = issue(&app).await;

    let response = app
        .clone()
        .oneshot(refresh_request(refresh_body(&pair), Some(SCENARIO_CLIENT_IP)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let rotated: TokenPair = json(response).await;
    assert_ne!(rotated.refresh_token, pair.refresh_token);

    let replay = app
        .clone()
        .oneshot(refresh_request(refresh_body(&pair), Some(SCENARIO_CLIENT_IP)))
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    let next = app
        .oneshot(refresh_request(refresh_body(&rotated), Some(SCENARIO_CLIENT_IP)))
        .await
        .unwrap();
    assert_eq!(next.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_bad_requests() {
    let app = app().await;
    let pair = issue(&app).await;

    let cases = [
        (refresh_body(&pair), None),
        (refresh_body(&pair), Some("bogus")),
        ("not json".to_string(), Some(SCENARIO_CLIENT_IP)),
        (
            r#"{"accessToken":"a"}"#.to_string(),
            Some(SCENARIO_CLIENT_IP),
        ),
        (
            r#"{"accessToken":"","refreshToken":""}"#.to_string(),
            Some(SCENARIO_CLIENT_IP),
        ),
    ];

    for (body, ip) in cases {
        let response = app.clone().oneshot(refresh_request(body, ip)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // None of the above consumed the pair.
    let response = app
        .oneshot(refresh_request(refresh_body(&pair), Some(SCENARIO_CLIENT_IP)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_garbage_tokens_unauthorized() {
    let app = app().await;
    let body = r#"{"accessToken":"x.y.z","refreshToken":"abc"}"#.to_string();

    let response = app
        .oneshot(refresh_request(body, Some(SCENARIO_CLIENT_IP)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: HealthResponse = json(response).await;
    assert_eq!(body.status, "ok");
}

#[tokio::test]
async fn test_metrics_exposed() {
    let app = app().await;
    issue(&app).await;

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("auth_token_tokens_issued_total"));
    assert!(text.contains("auth_token_http_latency_seconds"));
}
