//! Campaign DTOs for create, update, list, stats, and event listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{
    Campaign, CampaignId, CampaignStats, CampaignStatus, CampaignSummaryStats, CampaignUpdate,
    EmailEvent,
};

/// Request body for `POST /campaigns`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    /// Campaign key (required).
    #[serde(default)]
    pub campaign_id: Option<String>,
    /// Initial field values.
    #[serde(flatten)]
    pub fields: CampaignUpdate,
}

/// Response body for `POST /campaigns`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CampaignResponse {
    /// Always `true`.
    pub success: bool,
    /// Campaign after the write.
    pub campaign: Campaign,
}

/// Request body for `PUT /campaigns`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaignRequest {
    /// Campaign key (required).
    #[serde(default)]
    pub campaign_id: Option<String>,
    /// Fields to replace.
    #[serde(default)]
    pub updates: CampaignUpdate,
}

/// Response body for `GET /campaigns/{id}/stats`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStatsResponse {
    /// Always `true`.
    pub success: bool,
    /// Requested campaign.
    pub campaign_id: CampaignId,
    /// Campaign metadata.
    pub campaign: Campaign,
    /// Computed report.
    pub stats: CampaignStats,
    /// Most recent events, oldest first.
    pub events: Vec<EmailEvent>,
}

/// One entry of the campaign list.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummaryDto {
    /// Campaign key.
    pub campaign_id: CampaignId,
    /// Human-readable name.
    pub campaign_name: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: CampaignStatus,
    /// Targeted recipients.
    pub total_recipients: u64,
    /// Condensed stats.
    pub stats: CampaignSummaryStats,
}

impl From<(Campaign, CampaignSummaryStats)> for CampaignSummaryDto {
    fn from((campaign, stats): (Campaign, CampaignSummaryStats)) -> Self {
        Self {
            campaign_id: campaign.campaign_id,
            campaign_name: campaign.campaign_name,
            created_at: campaign.created_at,
            status: campaign.status,
            total_recipients: campaign.total_recipients,
            stats,
        }
    }
}

/// Response body for `GET /campaigns`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignListResponse {
    /// Always `true`.
    pub success: bool,
    /// Campaigns, oldest first.
    pub campaigns: Vec<CampaignSummaryDto>,
    /// Number of campaigns.
    pub total_campaigns: usize,
}

/// Response body for `GET /campaigns/{id}/events`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    /// Always `true`.
    pub success: bool,
    /// Requested campaign.
    pub campaign_id: CampaignId,
    /// Events on this page, insertion order.
    pub data: Vec<EmailEvent>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
