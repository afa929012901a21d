//! HTTP request handlers for the metrics endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use prometheus::{Registry, TextEncoder};
use tracing::error;

/// Prometheus text exposition content type.
const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics: run one scrape and render the exposition text.
///
/// Gathering drives the collector's blocking bus queries, so it runs on a
/// blocking thread instead of stalling the async workers.
pub async fn metrics(State(registry): State<Arc<Registry>>) -> Response {
    let encoded = tokio::task::spawn_blocking(move || encode(&registry)).await;

    match encoded {
        Ok(Ok(body)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Ok(Err(error)) => {
            error!(error = %error, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(error) => {
            error!(error = %error, "metrics scrape task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn encode(registry: &Registry) -> prometheus::Result<String> {
    let families = registry.gather();
    TextEncoder::new().encode_to_string(&families)
}
