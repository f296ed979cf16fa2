//! Immutable email engagement events.
//!
//! An [`EmailEvent`] is a timestamped fact about one recipient's
//! interaction with one campaign. Events are never mutated after they are
//! recorded; the store only appends and trims from the oldest end.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::CampaignId;
use crate::error::TrackerError;

/// Metadata key carrying the recipient's user agent.
pub const META_USER_AGENT: &str = "userAgent";
/// Metadata key carrying the destination of a tracked click.
pub const META_CLICKED_URL: &str = "clickedUrl";
/// Metadata key carrying the client IP address.
pub const META_IP: &str = "ip";

/// Open string-to-string metadata attached to an event.
pub type EventMetadata = HashMap<String, String>;

/// Kind of engagement an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Email handed to the delivery provider.
    Sent,
    /// Provider confirmed delivery.
    Delivered,
    /// Recipient opened the email.
    Opened,
    /// Recipient clicked a tracked link.
    Clicked,
    /// Delivery bounced.
    Bounced,
    /// Recipient unsubscribed.
    Unsubscribed,
}

impl EventType {
    /// All event types in report order.
    pub const ALL: [Self; 6] = [
        Self::Sent,
        Self::Delivered,
        Self::Opened,
        Self::Clicked,
        Self::Bounced,
        Self::Unsubscribed,
    ];

    /// Returns the wire name of the event type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Opened => "opened",
            Self::Clicked => "clicked",
            Self::Bounced => "bounced",
            Self::Unsubscribed => "unsubscribed",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TrackerError::InvalidEventType(s.to_string()))
    }
}

/// One recorded engagement fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailEvent {
    /// Unique event identifier (UUID v4), generated at insertion.
    pub id: String,
    /// Campaign the event belongs to. May reference a campaign that has
    /// not been created yet.
    pub campaign_id: CampaignId,
    /// Kind of engagement.
    pub event_type: EventType,
    /// Recipient address. Not unique within a campaign.
    pub email: String,
    /// Caller-supplied logical event time.
    pub timestamp: DateTime<Utc>,
    /// Server ingestion time.
    pub recorded_at: DateTime<Utc>,
    /// Opaque metadata; see the `META_*` keys for the recognized ones.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: EventMetadata,
}

impl EmailEvent {
    /// Builds a new event with a fresh ID and the current ingestion time.
    #[must_use]
    pub fn new(
        campaign_id: CampaignId,
        event_type: EventType,
        email: String,
        timestamp: DateTime<Utc>,
        metadata: EventMetadata,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            campaign_id,
            event_type,
            email,
            timestamp,
            recorded_at: Utc::now(),
            metadata,
        }
    }

    /// Returns the user agent carried in metadata, if any.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.metadata.get(META_USER_AGENT).map(String::as_str)
    }

    /// Returns the clicked URL carried in metadata, if any.
    #[must_use]
    pub fn clicked_url(&self) -> Option<&str> {
        self.metadata.get(META_CLICKED_URL).map(String::as_str)
    }
}
