//! HTTP surface: token issuance, rotation, health and metrics.

pub mod error;
pub mod handlers;

pub use error::{ApiError, ErrorBody, ErrorResponse};
pub use handlers::{HealthResponse, RefreshRequest};

use crate::issuer::TokenIssuer;
use crate::metrics::HTTP_LATENCY;
use crate::refresh::RefreshTokenRotator;
use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<TokenIssuer>,
    pub rotator: Arc<RefreshTokenRotator>,
}

impl AppState {
    pub fn new(issuer: Arc<TokenIssuer>, rotator: Arc<RefreshTokenRotator>) -> Self {
        Self { issuer, rotator }
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/access/:guid", get(handlers::access))
        .route("/refresh", post(handlers::refresh))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(track_latency))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Record request latency by matched route template.
async fn track_latency(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());
    let start = Instant::now();

    let response = next.run(req).await;
    HTTP_LATENCY
        .with_label_values(&[route.as_str(), response.status().as_str()])
        .observe(start.elapsed().as_secs_f64());

    response
}
