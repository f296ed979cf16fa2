//! Campaign metadata record and partial updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::CampaignId;

/// Lifecycle status of a campaign.
///
/// Transitions are caller-driven through the update endpoint; the store
/// does not enforce any ordering between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Campaign is being prepared.
    #[default]
    Draft,
    /// Emails are going out.
    Sending,
    /// All emails were sent.
    Completed,
}

/// Metadata for one tracked campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    /// Unique campaign key.
    pub campaign_id: CampaignId,
    /// Human-readable name.
    pub campaign_name: String,
    /// Server-assigned creation time (immutable).
    pub created_at: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: CampaignStatus,
    /// Number of recipients the campaign targets.
    pub total_recipients: u64,
}

impl Campaign {
    /// Creates a campaign with default metadata, then applies `update`.
    ///
    /// The name defaults to the campaign ID when the update carries none.
    #[must_use]
    pub fn new(campaign_id: CampaignId, update: CampaignUpdate) -> Self {
        let mut campaign = Self {
            campaign_name: campaign_id.to_string(),
            campaign_id,
            created_at: Utc::now(),
            status: CampaignStatus::default(),
            total_recipients: 0,
        };
        campaign.apply(update);
        campaign
    }

    /// Shallow merge: every field present in `update` replaces the stored one.
    pub fn apply(&mut self, update: CampaignUpdate) {
        if let Some(name) = update.campaign_name {
            self.campaign_name = name;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(total) = update.total_recipients {
            self.total_recipients = total;
        }
    }
}

/// Partial set of campaign fields. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignUpdate {
    /// New campaign name.
    #[serde(default)]
    pub campaign_name: Option<String>,
    /// New lifecycle status.
    #[serde(default)]
    pub status: Option<CampaignStatus>,
    /// New recipient count.
    #[serde(default)]
    pub total_recipients: Option<u64>,
}
