//! In-memory campaign table and per-campaign event logs.
//!
//! [`CampaignStore`] keeps two maps: campaign metadata, and one bounded
//! event log per campaign ID. Each log is individually protected by a
//! [`tokio::sync::RwLock`], so the append-and-trim sequence is atomic per
//! campaign while appends to different campaigns run concurrently.
//!
//! Lock order is always `campaigns` before `logs` before a single log.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::campaign::{Campaign, CampaignUpdate};
use super::email_event::{EmailEvent, EventMetadata, EventType};
use super::CampaignId;
use crate::error::TrackerError;

/// Default cap on stored events per campaign.
pub const DEFAULT_MAX_EVENTS_PER_CAMPAIGN: usize = 10_000;

/// Default cap on event logs whose campaign was never created.
pub const DEFAULT_MAX_ORPHAN_LOGS: usize = 10_000;

type SharedLog = Arc<RwLock<VecDeque<EmailEvent>>>;

#[derive(Debug, Default)]
struct LogTable {
    logs: HashMap<CampaignId, SharedLog>,
    /// Logs without a campaign record, oldest first.
    orphans: VecDeque<CampaignId>,
}

/// Result of [`CampaignStore::upsert_campaign`].
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    /// The campaign after the merge.
    pub campaign: Campaign,
    /// `true` if the campaign did not exist before.
    pub created: bool,
    /// Campaign evicted to stay within the retention limit, if any.
    pub evicted: Option<CampaignId>,
}

/// Process-local store for campaigns and their event logs.
///
/// Constructed once at startup and shared through `Arc`; tests build a
/// fresh store each.
///
/// # Retention
///
/// - Each event log holds at most `max_events_per_campaign` entries; the
///   oldest are dropped first.
/// - When `max_campaigns` is non-zero, creating a campaign beyond the
///   limit evicts the campaign with the oldest `created_at` together with
///   its log.
/// - Logs for campaigns that were never created are orphans. When
///   `max_orphan_logs` is non-zero, opening a log beyond that limit drops
///   the oldest orphan log. Creating the campaign adopts its log.
#[derive(Debug)]
pub struct CampaignStore {
    campaigns: RwLock<HashMap<CampaignId, Campaign>>,
    logs: RwLock<LogTable>,
    max_events_per_campaign: usize,
    max_campaigns: usize,
    max_orphan_logs: usize,
}

impl CampaignStore {
    /// Creates an empty store with the given limits.
    ///
    /// A `max_events_per_campaign` of zero is raised to one.
    #[must_use]
    pub fn new(max_events_per_campaign: usize, max_campaigns: usize) -> Self {
        Self {
            campaigns: RwLock::new(HashMap::new()),
            logs: RwLock::new(LogTable::default()),
            max_events_per_campaign: max_events_per_campaign.max(1),
            max_campaigns,
            max_orphan_logs: DEFAULT_MAX_ORPHAN_LOGS,
        }
    }

    /// Sets the orphan log limit (0 = unbounded).
    #[must_use]
    pub fn with_max_orphan_logs(mut self, max_orphan_logs: usize) -> Self {
        self.max_orphan_logs = max_orphan_logs;
        self
    }

    /// Appends an event to the campaign's log and returns it.
    ///
    /// Never fails: the campaign does not have to exist. If the log grows
    /// past the cap, the oldest events are discarded until exactly the cap
    /// remains.
    pub async fn record_event(
        &self,
        campaign_id: CampaignId,
        event_type: EventType,
        email: String,
        timestamp: DateTime<Utc>,
        metadata: EventMetadata,
    ) -> EmailEvent {
        let log = self.log_for_append(&campaign_id).await;
        let event = EmailEvent::new(campaign_id, event_type, email, timestamp, metadata);

        let mut log = log.write().await;
        log.push_back(event.clone());
        while log.len() > self.max_events_per_campaign {
            log.pop_front();
        }
        event
    }

    /// Returns the campaign's log in insertion order.
    ///
    /// A campaign without a log yields an empty vector.
    pub async fn events(&self, campaign_id: &CampaignId) -> Vec<EmailEvent> {
        match self.log(campaign_id).await {
            Some(log) => log.read().await.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Returns the `limit` most recently appended events, oldest first.
    pub async fn recent_events(&self, campaign_id: &CampaignId, limit: usize) -> Vec<EmailEvent> {
        let Some(log) = self.log(campaign_id).await else {
            return Vec::new();
        };
        let log = log.read().await;
        let skip = log.len().saturating_sub(limit);
        log.iter().skip(skip).cloned().collect()
    }

    /// Returns one page of the log (insertion order) and the total length.
    pub async fn events_page(
        &self,
        campaign_id: &CampaignId,
        offset: usize,
        limit: usize,
    ) -> (Vec<EmailEvent>, usize) {
        let Some(log) = self.log(campaign_id).await else {
            return (Vec::new(), 0);
        };
        let log = log.read().await;
        let page = log.iter().skip(offset).take(limit).cloned().collect();
        (page, log.len())
    }

    /// Returns the number of stored events for a campaign.
    pub async fn event_count(&self, campaign_id: &CampaignId) -> usize {
        match self.log(campaign_id).await {
            Some(log) => log.read().await.len(),
            None => 0,
        }
    }

    /// Creates the campaign if absent, otherwise merges `update` into it.
    pub async fn upsert_campaign(
        &self,
        campaign_id: CampaignId,
        update: CampaignUpdate,
    ) -> UpsertOutcome {
        let mut campaigns = self.campaigns.write().await;

        if let Some(existing) = campaigns.get_mut(&campaign_id) {
            existing.apply(update);
            return UpsertOutcome {
                campaign: existing.clone(),
                created: false,
                evicted: None,
            };
        }

        let mut table = self.logs.write().await;
        table.orphans.retain(|orphan| orphan != &campaign_id);

        let evicted = if self.max_campaigns > 0 && campaigns.len() >= self.max_campaigns {
            let oldest = campaigns
                .values()
                .min_by(|a, b| {
                    a.created_at
                        .cmp(&b.created_at)
                        .then_with(|| a.campaign_id.cmp(&b.campaign_id))
                })
                .map(|c| c.campaign_id.clone());
            if let Some(oldest) = &oldest {
                campaigns.remove(oldest);
                table.logs.remove(oldest);
            }
            oldest
        } else {
            None
        };

        let campaign = Campaign::new(campaign_id.clone(), update);
        campaigns.insert(campaign_id, campaign.clone());
        UpsertOutcome {
            campaign,
            created: true,
            evicted,
        }
    }

    /// Merges `update` into an existing campaign without creating one.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::CampaignNotFound`] if no campaign with the
    /// given ID exists.
    pub async fn update_campaign(
        &self,
        campaign_id: &CampaignId,
        update: CampaignUpdate,
    ) -> Result<Campaign, TrackerError> {
        let mut campaigns = self.campaigns.write().await;
        let campaign = campaigns
            .get_mut(campaign_id)
            .ok_or_else(|| TrackerError::CampaignNotFound(campaign_id.clone()))?;
        campaign.apply(update);
        Ok(campaign.clone())
    }

    /// Returns a copy of the campaign metadata.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::CampaignNotFound`] if no campaign with the
    /// given ID exists.
    pub async fn campaign(&self, campaign_id: &CampaignId) -> Result<Campaign, TrackerError> {
        self.campaigns
            .read()
            .await
            .get(campaign_id)
            .cloned()
            .ok_or_else(|| TrackerError::CampaignNotFound(campaign_id.clone()))
    }

    /// Returns all campaigns ordered by creation time.
    pub async fn list_campaigns(&self) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> = self.campaigns.read().await.values().cloned().collect();
        campaigns.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.campaign_id.cmp(&b.campaign_id))
        });
        campaigns
    }

    /// Removes a campaign and its event log.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::CampaignNotFound`] if no campaign with the
    /// given ID exists.
    pub async fn remove_campaign(&self, campaign_id: &CampaignId) -> Result<Campaign, TrackerError> {
        let mut campaigns = self.campaigns.write().await;
        let removed = campaigns
            .remove(campaign_id)
            .ok_or_else(|| TrackerError::CampaignNotFound(campaign_id.clone()))?;
        self.logs.write().await.logs.remove(campaign_id);
        Ok(removed)
    }

    /// Returns the number of campaigns in the store.
    pub async fn len(&self) -> usize {
        self.campaigns.read().await.len()
    }

    /// Returns `true` if the store holds no campaigns.
    pub async fn is_empty(&self) -> bool {
        self.campaigns.read().await.is_empty()
    }

    /// Returns the number of logs held for campaigns that do not exist.
    pub async fn orphan_log_count(&self) -> usize {
        self.logs.read().await.orphans.len()
    }

    async fn log(&self, campaign_id: &CampaignId) -> Option<SharedLog> {
        self.logs.read().await.logs.get(campaign_id).map(Arc::clone)
    }

    async fn log_for_append(&self, campaign_id: &CampaignId) -> SharedLog {
        if let Some(log) = self.log(campaign_id).await {
            return log;
        }

        let campaigns = self.campaigns.read().await;
        let mut table = self.logs.write().await;
        if let Some(log) = table.logs.get(campaign_id) {
            return Arc::clone(log);
        }

        let log = SharedLog::default();
        table.logs.insert(campaign_id.clone(), Arc::clone(&log));
        if !campaigns.contains_key(campaign_id) {
            table.orphans.push_back(campaign_id.clone());
            while self.max_orphan_logs > 0 && table.orphans.len() > self.max_orphan_logs {
                let Some(oldest) = table.orphans.pop_front() else {
                    break;
                };
                table.logs.remove(&oldest);
                tracing::debug!(campaign_id = %oldest, "orphan event log evicted");
            }
        }
        log
    }
}

impl Default for CampaignStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EVENTS_PER_CAMPAIGN, 0)
    }
}
