//! # campaign-tracker
//!
//! Email campaign event tracking and statistics service.
//!
//! The service records engagement events (sent, delivered, opened, clicked,
//! bounced, unsubscribed) per campaign, either explicitly through a JSON
//! endpoint or as a side effect of serving an open-tracking pixel or a
//! click redirect. Campaign reports are recomputed from the event log on
//! every request.
//!
//! ## Architecture
//!
//! ```text
//! Clients (pixel, redirect, JSON API, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── TrackingService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── CampaignStore (domain/)
//!     └── Stats aggregator (domain/stats)
//! ```
//!
//! All state is in memory and is lost on restart.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::config::TrackerConfig;
use crate::domain::{CampaignStore, EventBus};
use crate::service::TrackingService;

/// Wires the store, event bus, and service described by `config`.
#[must_use]
pub fn build_state(config: &TrackerConfig) -> AppState {
    let store = Arc::new(
        CampaignStore::new(config.max_events_per_campaign, config.max_campaigns)
            .with_max_orphan_logs(config.max_orphan_logs),
    );
    let event_bus = EventBus::new(config.event_bus_capacity);
    let tracking_service = Arc::new(TrackingService::new(
        store,
        event_bus.clone(),
        config.stats_options(),
        config.recent_events_limit,
    ));

    AppState {
        tracking_service,
        event_bus,
        click_fallback_url: Arc::from(config.click_fallback_url.as_str()),
    }
}

/// Builds the full HTTP application: REST API, `/ws` live feed, panic
/// recovery, tracing and CORS layers.
pub fn app(state: AppState) -> Router {
    with_http_layers(
        Router::new()
            .merge(api::build_router())
            .route("/ws", get(ws::handler::ws_handler)),
    )
    .with_state(state)
}

/// Panics inside a handler become a masked 500 with code 3000 instead of
/// a dropped connection.
fn with_http_layers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
