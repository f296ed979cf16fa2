//! Campaign handlers: list, create, update, stats, events, delete.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use super::tracking::required;
use crate::api::dto::{
    CampaignListResponse, CampaignResponse, CampaignStatsResponse, CampaignSummaryDto,
    CreateCampaignRequest, EventListResponse, PaginationParams, SuccessResponse,
    UpdateCampaignRequest,
};
use crate::app_state::AppState;
use crate::domain::CampaignId;
use crate::error::{ErrorResponse, TrackerError};

/// `GET /campaigns`: List all campaigns with condensed stats.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns",
    tag = "Campaigns",
    summary = "List campaigns",
    description = "Returns every campaign, oldest first, with sent/delivered/opened/clicked counts and open/click rates.",
    responses(
        (status = 200, description = "Campaign list", body = CampaignListResponse),
    )
)]
pub async fn list_campaigns(State(state): State<AppState>) -> impl IntoResponse {
    let campaigns: Vec<CampaignSummaryDto> = state
        .tracking_service
        .list_campaigns()
        .await
        .into_iter()
        .map(CampaignSummaryDto::from)
        .collect();

    Json(CampaignListResponse {
        success: true,
        total_campaigns: campaigns.len(),
        campaigns,
    })
}

/// `POST /campaigns`: Create a campaign, or merge fields into an existing one.
///
/// # Errors
///
/// Returns [`TrackerError::InvalidRequest`] on malformed JSON or a missing
/// `campaignId`.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns",
    tag = "Campaigns",
    summary = "Create a campaign",
    description = "Creates the campaign if absent (name defaults to the ID, status to draft); otherwise replaces the supplied fields.",
    request_body = CreateCampaignRequest,
    responses(
        (status = 201, description = "Campaign stored", body = CampaignResponse),
        (status = 400, description = "Missing campaignId", body = ErrorResponse),
    )
)]
pub async fn create_campaign(
    State(state): State<AppState>,
    payload: Result<Json<CreateCampaignRequest>, JsonRejection>,
) -> Result<impl IntoResponse, TrackerError> {
    let Json(req) = payload.map_err(|e| TrackerError::InvalidRequest(e.body_text()))?;
    let campaign_id = CampaignId::parse(&required(req.campaign_id, "campaignId")?)?;

    let campaign = state
        .tracking_service
        .upsert_campaign(campaign_id, req.fields)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(CampaignResponse {
            success: true,
            campaign,
        }),
    ))
}

/// `PUT /campaigns`: Update fields of an existing campaign.
///
/// # Errors
///
/// Returns [`TrackerError::InvalidRequest`] if `campaignId` is missing and
/// [`TrackerError::CampaignNotFound`] if the campaign does not exist.
#[utoipa::path(
    put,
    path = "/api/v1/campaigns",
    tag = "Campaigns",
    summary = "Update a campaign",
    description = "Shallow-merges `updates` into the campaign record. Status transitions are not enforced.",
    request_body = UpdateCampaignRequest,
    responses(
        (status = 200, description = "Campaign updated", body = SuccessResponse),
        (status = 400, description = "Missing campaignId", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn update_campaign(
    State(state): State<AppState>,
    payload: Result<Json<UpdateCampaignRequest>, JsonRejection>,
) -> Result<impl IntoResponse, TrackerError> {
    let Json(req) = payload.map_err(|e| TrackerError::InvalidRequest(e.body_text()))?;
    let campaign_id = CampaignId::parse(&required(req.campaign_id, "campaignId")?)?;

    state
        .tracking_service
        .update_campaign(&campaign_id, req.updates)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// `GET /campaigns/{id}/stats`: Compute the campaign report.
///
/// # Errors
///
/// Returns [`TrackerError::CampaignNotFound`] if the campaign has no
/// metadata record.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns/{id}/stats",
    tag = "Campaigns",
    summary = "Campaign statistics",
    description = "Recomputes counts, rates, hourly timeline, top links, and device breakdown from the event log, and returns the last events.",
    params(
        ("id" = String, Path, description = "Campaign ID"),
    ),
    responses(
        (status = 200, description = "Campaign report", body = CampaignStatsResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn campaign_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, TrackerError> {
    let campaign_id = CampaignId::parse(&id)?;
    let report = state.tracking_service.campaign_report(&campaign_id).await?;

    Ok(Json(CampaignStatsResponse {
        success: true,
        campaign_id,
        campaign: report.campaign,
        stats: report.stats,
        events: report.recent_events,
    }))
}

/// `GET /campaigns/{id}/events`: Page through the raw event log.
///
/// # Errors
///
/// Returns [`TrackerError::CampaignNotFound`] if the campaign does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns/{id}/events",
    tag = "Campaigns",
    summary = "List campaign events",
    description = "Returns the stored event log in insertion order, paginated.",
    params(
        ("id" = String, Path, description = "Campaign ID"),
        PaginationParams,
    ),
    responses(
        (status = 200, description = "Paginated events", body = EventListResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, TrackerError> {
    let campaign_id = CampaignId::parse(&id)?;
    let params = params.clamped();

    let (data, total) = state
        .tracking_service
        .events_page(&campaign_id, params.offset(), params.per_page as usize)
        .await?;

    Ok(Json(EventListResponse {
        success: true,
        campaign_id,
        data,
        pagination: params.meta(total),
    }))
}

/// `DELETE /campaigns/{id}`: Remove a campaign and its events.
///
/// # Errors
///
/// Returns [`TrackerError::CampaignNotFound`] if the campaign does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/campaigns/{id}",
    tag = "Campaigns",
    summary = "Delete a campaign",
    description = "Removes the campaign record and its event log and emits a campaign_removed notification.",
    params(
        ("id" = String, Path, description = "Campaign ID"),
    ),
    responses(
        (status = 204, description = "Campaign deleted"),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, TrackerError> {
    let campaign_id = CampaignId::parse(&id)?;
    state.tracking_service.remove_campaign(&campaign_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Campaign management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/campaigns",
            get(list_campaigns)
                .post(create_campaign)
                .put(update_campaign),
        )
        .route("/campaigns/{id}", axum::routing::delete(delete_campaign))
        .route("/campaigns/{id}/stats", get(campaign_stats))
        .route("/campaigns/{id}/events", get(list_events))
}
