//! Tracking service: orchestrates store operations and emits activity.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::email_event::{META_CLICKED_URL, META_IP, META_USER_AGENT};
use crate::domain::stats;
use crate::domain::{
    Campaign, CampaignId, CampaignStats, CampaignStore, CampaignSummaryStats, CampaignUpdate,
    EmailEvent, EventBus, EventMetadata, EventType, StatsOptions, TrackingEvent,
};
use crate::error::TrackerError;

/// User agent recorded for pixel opens; mail clients hide the real one.
pub const PIXEL_USER_AGENT: &str = "Email Client";

/// Stats report bundled with its campaign and the most recent events.
#[derive(Debug, Clone)]
pub struct CampaignReport {
    /// Campaign metadata.
    pub campaign: Campaign,
    /// Freshly computed statistics.
    pub stats: CampaignStats,
    /// Tail of the event log, oldest first.
    pub recent_events: Vec<EmailEvent>,
}

/// Orchestration layer for all tracking operations.
///
/// Owns references to [`CampaignStore`] for state and [`EventBus`] for
/// activity notifications. Every mutation follows the pattern: write to
/// the store → publish a [`TrackingEvent`] → log → return.
#[derive(Debug, Clone)]
pub struct TrackingService {
    store: Arc<CampaignStore>,
    event_bus: EventBus,
    stats_options: StatsOptions,
    recent_events_limit: usize,
}

impl TrackingService {
    /// Creates a new `TrackingService`.
    #[must_use]
    pub fn new(
        store: Arc<CampaignStore>,
        event_bus: EventBus,
        stats_options: StatsOptions,
        recent_events_limit: usize,
    ) -> Self {
        Self {
            store,
            event_bus,
            stats_options,
            recent_events_limit,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`CampaignStore`].
    #[must_use]
    pub fn store(&self) -> &Arc<CampaignStore> {
        &self.store
    }

    /// Records an event. `timestamp` defaults to the current time.
    pub async fn record_event(
        &self,
        campaign_id: CampaignId,
        event_type: EventType,
        email: String,
        timestamp: Option<DateTime<Utc>>,
        metadata: EventMetadata,
    ) -> EmailEvent {
        let timestamp = timestamp.unwrap_or_else(Utc::now);
        let event = self
            .store
            .record_event(campaign_id, event_type, email, timestamp, metadata)
            .await;

        tracing::debug!(
            campaign_id = %event.campaign_id,
            event_type = %event.event_type,
            event_id = %event.id,
            "email event recorded"
        );
        let _ = self.event_bus.publish(TrackingEvent::EventRecorded {
            event: event.clone(),
        });
        event
    }

    /// Records an `opened` event on behalf of the tracking pixel.
    pub async fn track_open(
        &self,
        campaign_id: CampaignId,
        email: String,
        client_ip: Option<String>,
    ) -> EmailEvent {
        let mut metadata = EventMetadata::new();
        metadata.insert(META_USER_AGENT.to_string(), PIXEL_USER_AGENT.to_string());
        if let Some(ip) = client_ip {
            metadata.insert(META_IP.to_string(), ip);
        }
        self.record_event(campaign_id, EventType::Opened, email, None, metadata)
            .await
    }

    /// Records a `clicked` event for a tracked link.
    pub async fn track_click(
        &self,
        campaign_id: CampaignId,
        email: String,
        url: &str,
        client_ip: Option<String>,
    ) -> EmailEvent {
        let mut metadata = EventMetadata::new();
        metadata.insert(META_CLICKED_URL.to_string(), url.to_string());
        if let Some(ip) = client_ip {
            metadata.insert(META_IP.to_string(), ip);
        }
        self.record_event(campaign_id, EventType::Clicked, email, None, metadata)
            .await
    }

    /// Computes the stats report for a campaign.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::CampaignNotFound`] if the campaign has no
    /// metadata record, even when orphan events exist for it.
    pub async fn campaign_report(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<CampaignReport, TrackerError> {
        let campaign = self.store.campaign(campaign_id).await?;
        let events = self.store.events(campaign_id).await;
        let stats = stats::aggregate(&events, Some(&campaign), &self.stats_options);

        let skip = events.len().saturating_sub(self.recent_events_limit);
        let recent_events = events.into_iter().skip(skip).collect();

        Ok(CampaignReport {
            campaign,
            stats,
            recent_events,
        })
    }

    /// Returns every campaign with its condensed stats, oldest first.
    pub async fn list_campaigns(&self) -> Vec<(Campaign, CampaignSummaryStats)> {
        let campaigns = self.store.list_campaigns().await;
        let mut summaries = Vec::with_capacity(campaigns.len());
        for campaign in campaigns {
            let events = self.store.events(&campaign.campaign_id).await;
            let stats = stats::aggregate(&events, Some(&campaign), &self.stats_options);
            summaries.push((campaign, CampaignSummaryStats::from(&stats)));
        }
        summaries
    }

    /// Creates a campaign or merges fields into an existing one.
    pub async fn upsert_campaign(
        &self,
        campaign_id: CampaignId,
        update: CampaignUpdate,
    ) -> Campaign {
        let outcome = self.store.upsert_campaign(campaign_id, update).await;

        if let Some(evicted) = outcome.evicted {
            tracing::warn!(campaign_id = %evicted, "campaign evicted by retention limit");
            let _ = self.event_bus.publish(TrackingEvent::CampaignRemoved {
                campaign_id: evicted,
                timestamp: Utc::now(),
            });
        }

        if outcome.created {
            tracing::info!(campaign_id = %outcome.campaign.campaign_id, "campaign created");
        }
        let _ = self.event_bus.publish(TrackingEvent::CampaignUpserted {
            campaign: outcome.campaign.clone(),
            created: outcome.created,
        });
        outcome.campaign
    }

    /// Updates an existing campaign.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::CampaignNotFound`] if the campaign does not
    /// exist; nothing is created in that case.
    pub async fn update_campaign(
        &self,
        campaign_id: &CampaignId,
        update: CampaignUpdate,
    ) -> Result<Campaign, TrackerError> {
        let campaign = self.store.update_campaign(campaign_id, update).await?;

        tracing::info!(%campaign_id, status = ?campaign.status, "campaign updated");
        let _ = self.event_bus.publish(TrackingEvent::CampaignUpserted {
            campaign: campaign.clone(),
            created: false,
        });
        Ok(campaign)
    }

    /// Removes a campaign together with its event log.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::CampaignNotFound`] if the campaign does not
    /// exist.
    pub async fn remove_campaign(&self, campaign_id: &CampaignId) -> Result<(), TrackerError> {
        let _campaign = self.store.remove_campaign(campaign_id).await?;

        let _ = self.event_bus.publish(TrackingEvent::CampaignRemoved {
            campaign_id: campaign_id.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(%campaign_id, "campaign removed");
        Ok(())
    }

    /// Returns one page of a campaign's event log and the log length.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::CampaignNotFound`] if the campaign does not
    /// exist.
    pub async fn events_page(
        &self,
        campaign_id: &CampaignId,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<EmailEvent>, usize), TrackerError> {
        let _campaign = self.store.campaign(campaign_id).await?;
        Ok(self.store.events_page(campaign_id, offset, limit).await)
    }
}
