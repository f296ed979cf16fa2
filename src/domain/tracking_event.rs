//! Activity notifications broadcast after every store mutation.
//!
//! Every recorded email event and every campaign change emits a
//! [`TrackingEvent`] through the [`super::EventBus`]. WebSocket clients
//! receive the ones matching their campaign subscriptions.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::campaign::Campaign;
use super::email_event::EmailEvent;
use super::CampaignId;

/// Notification emitted after a store mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackingEvent {
    /// An email event was appended to a campaign log.
    EventRecorded {
        /// The stored event.
        event: EmailEvent,
    },

    /// A campaign was created or updated.
    CampaignUpserted {
        /// Campaign state after the change.
        campaign: Campaign,
        /// `true` if the campaign was newly created.
        created: bool,
    },

    /// A campaign was deleted or evicted by the retention limit.
    CampaignRemoved {
        /// Removed campaign.
        #[serde(rename = "campaignId")]
        campaign_id: CampaignId,
        /// Removal time.
        timestamp: DateTime<Utc>,
    },
}

impl TrackingEvent {
    /// Returns the campaign this notification concerns.
    #[must_use]
    pub fn campaign_id(&self) -> &CampaignId {
        match self {
            Self::EventRecorded { event } => &event.campaign_id,
            Self::CampaignUpserted { campaign, .. } => &campaign.campaign_id,
            Self::CampaignRemoved { campaign_id, .. } => campaign_id,
        }
    }

    /// Returns the notification kind as a static string slice.
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::EventRecorded { .. } => "event_recorded",
            Self::CampaignUpserted { .. } => "campaign_upserted",
            Self::CampaignRemoved { .. } => "campaign_removed",
        }
    }
}
