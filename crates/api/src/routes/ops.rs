//! Health and Prometheus metrics endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::DateRange;
use inventory_store::InventoryStore;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// The service's current date, as used for booking validation.
    pub today: String,
}

/// GET /health: probes the store with a read of today's inventory row.
pub async fn health<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> (StatusCode, Json<HealthResponse>) {
    let today = state.clock.today();
    let status = match state.engine.store().inventory(DateRange::single(today)).await {
        Ok(_) => "ok",
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            "unavailable"
        }
    };

    let code = if status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(HealthResponse {
            status,
            today: today.to_string(),
        }),
    )
}

/// GET /metrics: returns Prometheus-formatted metrics.
pub async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}
