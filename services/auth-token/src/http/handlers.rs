use crate::http::error::ApiError;
use crate::http::AppState;
use crate::issuer::TokenPair;
use crate::metrics;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tracing::info;
use uuid::Uuid;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

const ACCESS_USAGE: &str =
    "A user GUID is required in the path and the client IP in the X-Forwarded-For header";
const REFRESH_USAGE: &str = "An accessToken and refreshToken are required in the JSON body and \
                             the client IP in the X-Forwarded-For header";

/// Body of a refresh request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// First address in `X-Forwarded-For`, if it parses as IPv4 or IPv6.
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok())
}

/// Canonical hyphenated UUID form only.
fn is_guid(value: &str) -> bool {
    value.len() == 36 && Uuid::try_parse(value).is_ok()
}

fn log_unauthorized(err: &ApiError, client_ip: &str) {
    if let ApiError::Unauthorized(cause) = err {
        info!(client_ip = %client_ip, error = %cause, "Unauthorized");
    }
}

/// `GET /access/:guid`
pub async fn access(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    headers: HeaderMap,
) -> Result<Json<TokenPair>, ApiError> {
    let ip = match client_ip(&headers) {
        Some(ip) if is_guid(&guid) => ip.to_string(),
        _ => {
            info!(guid = %guid, "Bad access request");
            return Err(ApiError::bad_request(ACCESS_USAGE));
        }
    };

    state
        .issuer
        .issue_pair(&guid, &ip)
        .await
        .map(Json)
        .map_err(|e| {
            let err = ApiError::from(e);
            log_unauthorized(&err, &ip);
            err
        })
}

/// `POST /refresh`
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let (Some(ip), Ok(Json(request))) = (client_ip(&headers), payload) else {
        info!("Bad refresh request");
        return Err(ApiError::bad_request(REFRESH_USAGE));
    };
    if request.access_token.is_empty() || request.refresh_token.is_empty() {
        info!("Bad refresh request");
        return Err(ApiError::bad_request(REFRESH_USAGE));
    }
    let ip = ip.to_string();

    state
        .rotator
        .rotate(&request.access_token, &request.refresh_token, &ip)
        .await
        .map(Json)
        .map_err(|e| {
            let err = ApiError::from(e);
            log_unauthorized(&err, &ip);
            err
        })
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// `GET /metrics`
pub async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let body = metrics::render().map_err(ApiError::Internal)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
