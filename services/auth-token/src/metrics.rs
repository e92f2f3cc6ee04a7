//! Prometheus metrics for the token service.

use crate::error::TokenError;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "auth_token_tokens_issued_total",
        "Total number of tokens issued",
        &["token_type"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Rotation attempts by outcome.
pub static ROTATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "auth_token_rotations_total",
        "Total number of token rotation attempts",
        &["outcome"]
    )
    .expect("Failed to register rotations metric")
});

/// Refresh token records revoked.
pub static REFRESH_TOKENS_REVOKED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "auth_token_refresh_tokens_revoked_total",
        "Total number of refresh token records revoked",
        &["reason"]
    )
    .expect("Failed to register refresh_tokens_revoked metric")
});

/// HTTP request latency histogram.
pub static HTTP_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "auth_token_http_latency_seconds",
        "HTTP request latency in seconds",
        &["route", "status"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register http_latency metric")
});

/// Render the default registry in the Prometheus text format.
pub fn render() -> Result<String, TokenError> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| TokenError::internal(format!("metrics encoding failed: {}", e)))?;
    into_text(buffer)
}

fn into_text(buffer: Vec<u8>) -> Result<String, TokenError> {
    String::from_utf8(buffer).map_err(|e| TokenError::internal(format!("metrics not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let before = TOKENS_ISSUED.with_label_values(&["access"]).get();
        TOKENS_ISSUED.with_label_values(&["access"]).inc();
        assert!(TOKENS_ISSUED.with_label_values(&["access"]).get() > before);
    }

    #[test]
    fn test_render_includes_registered_metrics() {
        ROTATIONS.with_label_values(&["success"]).inc();
        let text = render().unwrap();
        assert!(text.contains("auth_token_rotations_total"));
    }

    #[test]
    fn test_invalid_utf8_maps_to_internal() {
        let err = into_text(vec![0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, TokenError::Internal(_)));
        assert_eq!(err.code(), crate::error::INTERNAL_ERROR);
    }
}
