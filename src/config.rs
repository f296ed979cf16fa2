//! Tracker configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;

use crate::domain::campaign_store::{DEFAULT_MAX_EVENTS_PER_CAMPAIGN, DEFAULT_MAX_ORPHAN_LOGS};
use crate::domain::stats::DEFAULT_TOP_LINKS_LIMIT;
use crate::domain::{DeliveryPolicy, StatsOptions};

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Top-level tracker configuration.
///
/// Loaded once at startup via [`TrackerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Maximum events kept per campaign log (oldest dropped first).
    pub max_events_per_campaign: usize,

    /// Maximum campaigns kept before the oldest is evicted (0 = unbounded).
    pub max_campaigns: usize,

    /// Maximum logs kept for campaigns that were never created, oldest
    /// dropped first (0 = unbounded).
    pub max_orphan_logs: usize,

    /// Number of most recent events returned with a stats report.
    pub recent_events_limit: usize,

    /// Number of entries in the top-links list.
    pub top_links_limit: usize,

    /// Treat `sent` as `delivered` when no delivery events were recorded.
    pub assume_delivered_when_unconfirmed: bool,

    /// Redirect target for click requests with missing parameters.
    pub click_fallback_url: String,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_events_per_campaign: DEFAULT_MAX_EVENTS_PER_CAMPAIGN,
            max_campaigns: 10_000,
            max_orphan_logs: DEFAULT_MAX_ORPHAN_LOGS,
            recent_events_limit: 100,
            top_links_limit: DEFAULT_TOP_LINKS_LIMIT,
            assume_delivered_when_unconfirmed: true,
            click_fallback_url: "/".to_string(),
            event_bus_capacity: 10_000,
            log_format: LogFormat::Pretty,
        }
    }
}

impl TrackerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to [`TrackerConfig::default`] values when a variable is
    /// not set. Calls `dotenvy::dotenv().ok()` to optionally load a `.env`
    /// file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr: SocketAddr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            listen_addr,
            max_events_per_campaign: parse_env(
                "MAX_EVENTS_PER_CAMPAIGN",
                defaults.max_events_per_campaign,
            ),
            max_campaigns: parse_env("MAX_CAMPAIGNS", defaults.max_campaigns),
            max_orphan_logs: parse_env("MAX_ORPHAN_LOGS", defaults.max_orphan_logs),
            recent_events_limit: parse_env("RECENT_EVENTS_LIMIT", defaults.recent_events_limit),
            top_links_limit: parse_env("TOP_LINKS_LIMIT", defaults.top_links_limit),
            assume_delivered_when_unconfirmed: parse_env_bool(
                "ASSUME_DELIVERED_WHEN_UNCONFIRMED",
                defaults.assume_delivered_when_unconfirmed,
            ),
            click_fallback_url: std::env::var("CLICK_FALLBACK_URL")
                .unwrap_or(defaults.click_fallback_url),
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", defaults.event_bus_capacity),
            log_format,
        })
    }

    /// Builds the aggregator options implied by this configuration.
    #[must_use]
    pub fn stats_options(&self) -> StatsOptions {
        StatsOptions {
            delivery_policy: if self.assume_delivered_when_unconfirmed {
                DeliveryPolicy::AssumeDelivered
            } else {
                DeliveryPolicy::ConfirmedOnly
            },
            top_links_limit: self.top_links_limit,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("TRUE") | Some("1") => true,
        Some("false") | Some("FALSE") | Some("0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = TrackerConfig::default();
        assert_eq!(config.max_events_per_campaign, 10_000);
        assert_eq!(config.max_orphan_logs, 10_000);
        assert_eq!(config.recent_events_limit, 100);
        assert_eq!(config.top_links_limit, 10);
        assert!(config.assume_delivered_when_unconfirmed);
        assert_eq!(config.click_fallback_url, "/");
    }

    #[test]
    fn stats_options_follow_delivery_flag() {
        let mut config = TrackerConfig::default();
        assert_eq!(
            config.stats_options().delivery_policy,
            DeliveryPolicy::AssumeDelivered
        );
        config.assume_delivered_when_unconfirmed = false;
        assert_eq!(
            config.stats_options().delivery_policy,
            DeliveryPolicy::ConfirmedOnly
        );
    }

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        assert_eq!(parse_env("CAMPAIGN_TRACKER_TEST_UNSET_KEY", 42usize), 42);
        assert!(parse_env_bool("CAMPAIGN_TRACKER_TEST_UNSET_KEY", true));
    }
}
