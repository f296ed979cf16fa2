//! Per-connection subscription manager.
//!
//! Tracks which campaign IDs a WebSocket client is subscribed to and
//! provides server-side filtering of tracking activity.

use std::collections::HashSet;

use crate::domain::CampaignId;

/// Manages the set of campaign subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed campaign IDs. If `subscribe_all` is true, this set is ignored.
    campaign_ids: HashSet<CampaignId>,
    /// Whether the client subscribes to all campaigns (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds campaign IDs to the subscription set and optionally enables
    /// the wildcard.
    pub fn subscribe(&mut self, ids: &[CampaignId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.campaign_ids.extend(ids.iter().cloned());
    }

    /// Removes campaign IDs from the subscription set. `wildcard` clears
    /// the catch-all subscription.
    pub fn unsubscribe(&mut self, ids: &[CampaignId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.campaign_ids.remove(id);
        }
    }

    /// Returns `true` if the given campaign matches the subscription filter.
    #[must_use]
    pub fn matches(&self, campaign_id: &CampaignId) -> bool {
        self.subscribe_all || self.campaign_ids.contains(campaign_id)
    }

    /// Returns the number of explicitly subscribed campaigns.
    #[must_use]
    pub fn count(&self) -> usize {
        self.campaign_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
