//! System endpoints: health check and tracking vocabulary.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::EventType;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Supported event type info.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeInfo {
    event_type: &'static str,
    description: &'static str,
    deduplicated: bool,
}

/// `GET /config/event-types`: List accepted event types.
#[utoipa::path(
    get,
    path = "/config/event-types",
    tag = "System",
    summary = "List event types",
    description = "Returns every event type the ingestion endpoint accepts and whether stats count it per distinct recipient.",
    responses(
        (status = 200, description = "Event type catalog", body = Vec<EventTypeInfo>),
    )
)]
pub async fn event_types_handler() -> impl IntoResponse {
    let types: Vec<EventTypeInfo> = EventType::ALL
        .into_iter()
        .map(|t| EventTypeInfo {
            event_type: t.as_str(),
            description: match t {
                EventType::Sent => "Email handed to the delivery provider",
                EventType::Delivered => "Provider confirmed delivery",
                EventType::Opened => "Recipient opened the email (tracking pixel)",
                EventType::Clicked => "Recipient followed a tracked link",
                EventType::Bounced => "Delivery failed",
                EventType::Unsubscribed => "Recipient opted out",
            },
            deduplicated: matches!(t, EventType::Opened | EventType::Clicked),
        })
        .collect();
    (StatusCode::OK, Json(types))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/event-types", get(event_types_handler))
}
