use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use evsim_generator::Industry;
use serde::{Deserialize, Serialize};
use tower::{limit::ConcurrencyLimitLayer, ServiceBuilder};

use crate::config::{ConfigUpdate, StreamConfig};
use crate::error::ApiError;
use crate::event_log::LoggedEvent;
use crate::simulator::{Simulator, StreamStatus};

pub type SharedSimulator = Arc<Simulator>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    ok: bool,
    running: bool,
    total_events: u64,
    logged: usize,
}

#[derive(Debug, Serialize)]
struct ClearResponse {
    cleared: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IndustryInfo {
    id: Industry,
    label: &'static str,
    events: &'static [&'static str],
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

pub fn router(simulator: SharedSimulator, max_concurrency: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config", get(get_config).patch(patch_config))
        .route("/stream", get(stream_status))
        .route("/stream/start", post(start_stream))
        .route("/stream/stop", post(stop_stream))
        .route("/stream/toggle", post(toggle_stream))
        .route("/events", get(list_events).post(generate_event).delete(clear_events))
        .route("/events/:id", get(get_event))
        .route("/industries", get(list_industries))
        .layer(ServiceBuilder::new().layer(ConcurrencyLimitLayer::new(max_concurrency.max(1))))
        .with_state(simulator)
}

async fn health_handler(State(sim): State<SharedSimulator>) -> Json<HealthResponse> {
    let status = sim.status().await;
    Json(HealthResponse {
        ok: true,
        running: status.running,
        total_events: status.total_events,
        logged: status.logged,
    })
}

async fn get_config(State(sim): State<SharedSimulator>) -> Json<StreamConfig> {
    Json(sim.config().await)
}

async fn patch_config(
    State(sim): State<SharedSimulator>,
    payload: Result<Json<ConfigUpdate>, JsonRejection>,
) -> Result<Json<StreamConfig>, ApiError> {
    let Json(update) = payload?;
    Ok(Json(sim.update(update).await))
}

async fn stream_status(State(sim): State<SharedSimulator>) -> Json<StreamStatus> {
    Json(sim.status().await)
}

async fn start_stream(State(sim): State<SharedSimulator>) -> Json<StreamStatus> {
    sim.start().await;
    Json(sim.status().await)
}

async fn stop_stream(State(sim): State<SharedSimulator>) -> Json<StreamStatus> {
    sim.stop().await;
    Json(sim.status().await)
}

async fn toggle_stream(State(sim): State<SharedSimulator>) -> Json<StreamStatus> {
    sim.toggle().await;
    Json(sim.status().await)
}

async fn list_events(
    State(sim): State<SharedSimulator>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<LoggedEvent>> {
    Json(sim.events(query.limit).await)
}

async fn generate_event(State(sim): State<SharedSimulator>) -> (StatusCode, Json<LoggedEvent>) {
    (StatusCode::CREATED, Json(sim.generate_once().await))
}

async fn clear_events(State(sim): State<SharedSimulator>) -> Json<ClearResponse> {
    Json(ClearResponse {
        cleared: sim.clear_events().await,
    })
}

async fn get_event(
    State(sim): State<SharedSimulator>,
    Path(id): Path<u64>,
) -> Result<Json<LoggedEvent>, ApiError> {
    sim.event(id).await.map(Json).ok_or(ApiError::EventNotFound(id))
}

async fn list_industries() -> Json<Vec<IndustryInfo>> {
    Json(
        Industry::ALL
            .into_iter()
            .map(|industry| IndustryInfo {
                id: industry,
                label: industry.label(),
                events: industry.template().events,
            })
            .collect(),
    )
}
