//! Tracking DTOs: pixel and click query strings, explicit ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::EventMetadata;

/// Query string of the open-tracking pixel.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OpenParams {
    /// Campaign the email belongs to.
    #[serde(default)]
    pub campaign_id: Option<String>,
    /// Recipient address.
    #[serde(default)]
    pub email: Option<String>,
}

/// Query string of the click-tracking redirect.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ClickParams {
    /// Campaign the email belongs to.
    #[serde(default)]
    pub campaign_id: Option<String>,
    /// Recipient address.
    #[serde(default)]
    pub email: Option<String>,
    /// Destination URL.
    #[serde(default)]
    pub url: Option<String>,
}

/// Request body for `POST /track/events`.
///
/// Required fields are optional here so that a missing one produces a
/// validation error naming the field instead of a generic JSON error.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordEventRequest {
    /// Campaign the event belongs to (required).
    #[serde(default)]
    pub campaign_id: Option<String>,
    /// Event type wire name (required).
    #[serde(default)]
    pub event_type: Option<String>,
    /// Recipient address (required).
    #[serde(default)]
    pub email: Option<String>,
    /// Logical event time; defaults to now.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Opaque string metadata.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<EventMetadata>,
}

/// Response body for `POST /track/events`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordEventResponse {
    /// Always `true`.
    pub success: bool,
    /// ID assigned to the stored event.
    pub event_id: String,
}
