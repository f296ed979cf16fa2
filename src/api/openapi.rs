//! OpenAPI document covering every REST endpoint.

use utoipa::OpenApi;

use crate::api::dto;
use crate::api::handlers::{campaign, system, tracking};
use crate::domain::{Campaign, CampaignStatus, CampaignUpdate, EmailEvent, EventType, stats};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI document for the tracker.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "campaign-tracker",
        description = "Email campaign open/click tracking and engagement statistics."
    ),
    paths(
        tracking::open_pixel,
        tracking::click_redirect,
        tracking::record_event,
        campaign::list_campaigns,
        campaign::create_campaign,
        campaign::update_campaign,
        campaign::campaign_stats,
        campaign::list_events,
        campaign::delete_campaign,
        system::health_handler,
        system::event_types_handler,
    ),
    components(schemas(
        ErrorResponse,
        ErrorBody,
        dto::RecordEventRequest,
        dto::RecordEventResponse,
        dto::CreateCampaignRequest,
        dto::CampaignResponse,
        dto::UpdateCampaignRequest,
        dto::CampaignStatsResponse,
        dto::CampaignSummaryDto,
        dto::CampaignListResponse,
        dto::EventListResponse,
        dto::PaginationMeta,
        dto::SuccessResponse,
        Campaign,
        CampaignStatus,
        CampaignUpdate,
        EmailEvent,
        EventType,
        stats::CampaignStats,
        stats::CampaignSummaryStats,
        stats::TimelineBucket,
        stats::LinkStat,
        stats::DeviceStat,
        stats::DeviceClass,
    )),
    tags(
        (name = "Tracking", description = "Pixel, redirect, and event ingestion"),
        (name = "Campaigns", description = "Campaign metadata and statistics"),
        (name = "System", description = "Health and service metadata"),
    )
)]
pub struct ApiDoc;
