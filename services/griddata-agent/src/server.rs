//! HTTP server for the agent status API.
//!
//! Provides endpoints for:
//! - Overall agent status and the current grid cell
//! - Per-quantity sensor states and attributes
//! - Prometheus metrics

use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use griddata_core::{Coordinate, GridCell, GridSensor, ObservationSnapshot, SensorAttributes};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub service: String,
    pub status: String,
    pub coordinate: Coordinate,
    pub cell: Option<GridCell>,
    pub update_time: Option<DateTime<Utc>>,
    pub sensors: Vec<SensorStateResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SensorStateResponse {
    pub name: String,
    pub unique_id: String,
    pub state: usize,
    pub uom: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SensorDetailResponse {
    pub name: String,
    pub unique_id: String,
    pub state: usize,
    pub attributes: SensorAttributes,
}

// ============================================================================
// Shared State
// ============================================================================

pub struct ServerState {
    pub coordinate: Coordinate,
    pub snapshot: watch::Receiver<ObservationSnapshot>,
    pub sensors: Vec<GridSensor>,
    pub prometheus: PrometheusHandle,
}

// ============================================================================
// Router
// ============================================================================

/// Create the status API router.
pub fn create_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/status", get(status_handler))
        .route("/sensors", get(sensors_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(Extension(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /status - Current cell, update time, and sensor states
async fn status_handler(Extension(state): Extension<Arc<ServerState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.borrow().clone();

    let sensors: Vec<SensorStateResponse> = state
        .sensors
        .iter()
        .map(|s| SensorStateResponse {
            name: s.name(),
            unique_id: s.unique_id(),
            state: s.state(),
            uom: s.attributes().uom,
        })
        .collect();

    let response = StatusResponse {
        service: "griddata-agent".to_string(),
        status: if snapshot.cell.is_some() {
            "observing".to_string()
        } else {
            "resolving".to_string()
        },
        coordinate: state.coordinate,
        cell: snapshot.cell,
        update_time: snapshot.update_time,
        sensors,
    };

    Json(response)
}

/// GET /sensors - Full sensor attributes
async fn sensors_handler(Extension(state): Extension<Arc<ServerState>>) -> impl IntoResponse {
    let sensors: Vec<SensorDetailResponse> = state
        .sensors
        .iter()
        .map(|s| SensorDetailResponse {
            name: s.name(),
            unique_id: s.unique_id(),
            state: s.state(),
            attributes: s.attributes(),
        })
        .collect();

    Json(sensors)
}

/// GET /metrics - Prometheus metrics
async fn metrics_handler(Extension(state): Extension<Arc<ServerState>>) -> impl IntoResponse {
    state.prometheus.render()
}

/// GET /health - Health check endpoint
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "griddata-agent"
    }))
}

/// Start the HTTP server.
pub async fn run_server(state: Arc<ServerState>, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    info!(port = port, "Starting agent status server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
