//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::TrackingService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Tracking service for all business logic.
    pub tracking_service: Arc<TrackingService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Redirect target for click requests with missing parameters.
    pub click_fallback_url: Arc<str>,
}
