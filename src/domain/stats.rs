//! Campaign statistics derived from an event log.
//!
//! [`aggregate`] is a pure function: it walks the log once (plus the sorts
//! needed for the timeline, top links and device breakdown) and never
//! caches anything. Every stats request recomputes the report.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::campaign::Campaign;
use super::email_event::{EmailEvent, EventType};

/// Default number of entries in the top-links list.
pub const DEFAULT_TOP_LINKS_LIMIT: usize = 10;

/// Width of one timeline bucket.
const BUCKET_SECS: i64 = 3_600;

/// How `delivered` is derived when no delivery confirmations exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// With zero `delivered` events, treat every sent email as delivered.
    #[default]
    AssumeDelivered,
    /// Only count explicit `delivered` events.
    ConfirmedOnly,
}

/// Knobs for [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsOptions {
    /// Delivery fallback policy.
    pub delivery_policy: DeliveryPolicy,
    /// Maximum number of top links reported.
    pub top_links_limit: usize,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            delivery_policy: DeliveryPolicy::default(),
            top_links_limit: DEFAULT_TOP_LINKS_LIMIT,
        }
    }
}

/// Device class inferred from a user agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum DeviceClass {
    /// Phones.
    Mobile,
    /// Tablets.
    Tablet,
    /// Desktop browsers.
    Desktop,
    /// Mail user agents (also used for pixel opens).
    #[serde(rename = "Email Client")]
    EmailClient,
    /// Nothing matched.
    Unknown,
}

/// Ordered classification rules; the first rule whose needle occurs in the
/// user agent wins.
const DEVICE_RULES: [(&str, DeviceClass); 4] = [
    ("Mobile", DeviceClass::Mobile),
    ("Tablet", DeviceClass::Tablet),
    ("Desktop", DeviceClass::Desktop),
    ("Email Client", DeviceClass::EmailClient),
];

/// Classifies a user agent by substring, in rule order.
#[must_use]
pub fn classify_user_agent(user_agent: &str) -> DeviceClass {
    DEVICE_RULES
        .iter()
        .find(|(needle, _)| user_agent.contains(needle))
        .map_or(DeviceClass::Unknown, |(_, class)| *class)
}

/// Event counts for one hour of event time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimelineBucket {
    /// Start of the hour (UTC).
    pub hour: DateTime<Utc>,
    /// `sent` events in the hour.
    pub sent: u64,
    /// `opened` events in the hour.
    pub opened: u64,
    /// `clicked` events in the hour.
    pub clicked: u64,
    /// All events in the hour, any type.
    pub total: u64,
}

/// Click count for one destination URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkStat {
    /// Destination URL.
    pub url: String,
    /// Number of clicks.
    pub clicks: u64,
}

/// Event count for one device class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStat {
    /// Device class.
    pub device: DeviceClass,
    /// Number of events attributed to the class.
    pub count: u64,
}

/// Full statistics report for one campaign.
///
/// Rates are percentages in `[0, 100]`, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStats {
    /// `sent` events.
    pub sent: u64,
    /// `delivered` events, or `sent` under [`DeliveryPolicy::AssumeDelivered`]
    /// when there are none.
    pub delivered: u64,
    /// Raw `opened` events.
    pub opened: u64,
    /// Raw `clicked` events.
    pub clicked: u64,
    /// `bounced` events.
    pub bounced: u64,
    /// `unsubscribed` events.
    pub unsubscribed: u64,
    /// Distinct recipients with at least one open.
    pub unique_opens: u64,
    /// Distinct recipients with at least one click.
    pub unique_clicks: u64,
    /// delivered / sent.
    pub delivery_rate: f64,
    /// unique opens / delivered.
    pub open_rate: f64,
    /// unique clicks / delivered.
    pub click_rate: f64,
    /// bounced / sent.
    pub bounce_rate: f64,
    /// unsubscribed / delivered.
    pub unsubscribe_rate: f64,
    /// Hourly buckets, ascending, empty hours omitted.
    pub timeline: Vec<TimelineBucket>,
    /// Most clicked URLs, descending.
    pub top_links: Vec<LinkStat>,
    /// Events per device class, descending.
    pub device_stats: Vec<DeviceStat>,
    /// Recipients from campaign metadata, 0 if unknown.
    pub total_recipients: u64,
    /// Span between earliest and latest event timestamps, in milliseconds.
    pub campaign_duration: i64,
    /// Timestamp of the most recently appended event.
    pub last_activity: Option<DateTime<Utc>>,
}

/// Condensed stats shown in the campaign list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummaryStats {
    /// `sent` events.
    pub sent: u64,
    /// Delivered count (see [`CampaignStats::delivered`]).
    pub delivered: u64,
    /// Unique opens.
    pub opened: u64,
    /// Unique clicks.
    pub clicked: u64,
    /// Open rate percentage.
    pub open_rate: f64,
    /// Click rate percentage.
    pub click_rate: f64,
}

impl From<&CampaignStats> for CampaignSummaryStats {
    fn from(stats: &CampaignStats) -> Self {
        Self {
            sent: stats.sent,
            delivered: stats.delivered,
            opened: stats.unique_opens,
            clicked: stats.unique_clicks,
            open_rate: stats.open_rate,
            click_rate: stats.click_rate,
        }
    }
}

/// Computes the statistics report for an event log.
///
/// `events` must be in insertion order; `last_activity` is taken from the
/// final element. `campaign` only contributes `total_recipients`.
#[must_use]
pub fn aggregate(
    events: &[EmailEvent],
    campaign: Option<&Campaign>,
    options: &StatsOptions,
) -> CampaignStats {
    let mut counts: HashMap<EventType, u64> = HashMap::new();
    let mut openers: HashSet<&str> = HashSet::new();
    let mut clickers: HashSet<&str> = HashSet::new();

    for event in events {
        *counts.entry(event.event_type).or_insert(0) += 1;
        match event.event_type {
            EventType::Opened => {
                openers.insert(event.email.as_str());
            }
            EventType::Clicked => {
                clickers.insert(event.email.as_str());
            }
            _ => {}
        }
    }

    let count = |t: EventType| counts.get(&t).copied().unwrap_or(0);
    let sent = count(EventType::Sent);
    let delivered = match (count(EventType::Delivered), options.delivery_policy) {
        (0, DeliveryPolicy::AssumeDelivered) => sent,
        (n, _) => n,
    };
    let bounced = count(EventType::Bounced);
    let unsubscribed = count(EventType::Unsubscribed);
    let unique_opens = openers.len() as u64;
    let unique_clicks = clickers.len() as u64;

    CampaignStats {
        sent,
        delivered,
        opened: count(EventType::Opened),
        clicked: count(EventType::Clicked),
        bounced,
        unsubscribed,
        unique_opens,
        unique_clicks,
        delivery_rate: rate(delivered, sent),
        open_rate: rate(unique_opens, delivered),
        click_rate: rate(unique_clicks, delivered),
        bounce_rate: rate(bounced, sent),
        unsubscribe_rate: rate(unsubscribed, delivered),
        timeline: timeline(events),
        top_links: top_links(events, options.top_links_limit),
        device_stats: device_stats(events),
        total_recipients: campaign.map_or(0, |c| c.total_recipients),
        campaign_duration: duration_ms(events),
        last_activity: events.last().map(|e| e.timestamp),
    }
}

/// Percentage rounded to two decimals; zero denominator yields 0.
fn rate(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let pct = numerator as f64 / denominator as f64 * 100.0;
    ((pct * 100.0).round() / 100.0).clamp(0.0, 100.0)
}

fn hour_start(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(BUCKET_SECS), 0).unwrap_or(ts)
}

fn timeline(events: &[EmailEvent]) -> Vec<TimelineBucket> {
    let mut buckets: BTreeMap<DateTime<Utc>, TimelineBucket> = BTreeMap::new();
    for event in events {
        let hour = hour_start(event.timestamp);
        let bucket = buckets.entry(hour).or_insert_with(|| TimelineBucket {
            hour,
            sent: 0,
            opened: 0,
            clicked: 0,
            total: 0,
        });
        bucket.total += 1;
        match event.event_type {
            EventType::Sent => bucket.sent += 1,
            EventType::Opened => bucket.opened += 1,
            EventType::Clicked => bucket.clicked += 1,
            _ => {}
        }
    }
    buckets.into_values().collect()
}

fn top_links(events: &[EmailEvent], limit: usize) -> Vec<LinkStat> {
    let mut links: Vec<LinkStat> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for event in events.iter().filter(|e| e.event_type == EventType::Clicked) {
        let Some(url) = event.clicked_url() else {
            continue;
        };
        if let Some(link) = index.get(url).and_then(|&i| links.get_mut(i)) {
            link.clicks += 1;
        } else {
            index.insert(url, links.len());
            links.push(LinkStat {
                url: url.to_string(),
                clicks: 1,
            });
        }
    }

    // Stable: ties keep first-seen order.
    links.sort_by(|a, b| b.clicks.cmp(&a.clicks));
    links.truncate(limit);
    links
}

fn device_stats(events: &[EmailEvent]) -> Vec<DeviceStat> {
    let mut stats: Vec<DeviceStat> = Vec::new();
    for class in events.iter().filter_map(|e| e.user_agent()).map(classify_user_agent) {
        if let Some(stat) = stats.iter_mut().find(|s| s.device == class) {
            stat.count += 1;
        } else {
            stats.push(DeviceStat {
                device: class,
                count: 1,
            });
        }
    }
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

fn duration_ms(events: &[EmailEvent]) -> i64 {
    let min = events.iter().map(|e| e.timestamp).min();
    let max = events.iter().map(|e| e.timestamp).max();
    match (min, max) {
        (Some(min), Some(max)) => (max - min).num_milliseconds(),
        _ => 0,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::campaign::CampaignUpdate;
    use crate::domain::email_event::{EventMetadata, META_CLICKED_URL, META_USER_AGENT};
    use crate::domain::CampaignId;
    use chrono::TimeZone;

    fn cid() -> CampaignId {
        let Ok(id) = CampaignId::parse("c1") else {
            panic!("valid id");
        };
        id
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        let Some(ts) = Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).single() else {
            panic!("valid timestamp");
        };
        ts
    }

    fn event(event_type: EventType, email: &str, ts: DateTime<Utc>) -> EmailEvent {
        EmailEvent::new(cid(), event_type, email.to_string(), ts, EventMetadata::new())
    }

    fn with_meta(mut e: EmailEvent, key: &str, value: &str) -> EmailEvent {
        e.metadata.insert(key.to_string(), value.to_string());
        e
    }

    fn stats(events: &[EmailEvent]) -> CampaignStats {
        aggregate(events, None, &StatsOptions::default())
    }

    #[test]
    fn empty_log_yields_zeroed_report() {
        let report = stats(&[]);
        assert_eq!(report.sent, 0);
        assert_eq!(report.delivered, 0);
        assert_eq!(report.delivery_rate, 0.0);
        assert_eq!(report.open_rate, 0.0);
        assert_eq!(report.click_rate, 0.0);
        assert_eq!(report.bounce_rate, 0.0);
        assert_eq!(report.unsubscribe_rate, 0.0);
        assert!(report.timeline.is_empty());
        assert!(report.top_links.is_empty());
        assert!(report.device_stats.is_empty());
        assert_eq!(report.campaign_duration, 0);
        assert!(report.last_activity.is_none());
    }

    #[test]
    fn delivered_falls_back_to_sent() {
        let events: Vec<EmailEvent> = (0..5)
            .map(|i| event(EventType::Sent, &format!("r{i}@b.com"), at(9, 0)))
            .collect();
        let report = stats(&events);
        assert_eq!(report.delivered, 5);
        assert_eq!(report.delivery_rate, 100.0);
    }

    #[test]
    fn confirmed_only_policy_disables_fallback() {
        let events: Vec<EmailEvent> = (0..5)
            .map(|i| event(EventType::Sent, &format!("r{i}@b.com"), at(9, 0)))
            .collect();
        let options = StatsOptions {
            delivery_policy: DeliveryPolicy::ConfirmedOnly,
            ..StatsOptions::default()
        };
        let report = aggregate(&events, None, &options);
        assert_eq!(report.delivered, 0);
        assert_eq!(report.delivery_rate, 0.0);
        assert_eq!(report.open_rate, 0.0);
    }

    #[test]
    fn explicit_delivered_count_wins() {
        let events = vec![
            event(EventType::Sent, "a@b.com", at(9, 0)),
            event(EventType::Sent, "b@b.com", at(9, 0)),
            event(EventType::Sent, "c@b.com", at(9, 0)),
            event(EventType::Delivered, "a@b.com", at(9, 1)),
            event(EventType::Delivered, "b@b.com", at(9, 1)),
        ];
        let report = stats(&events);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.delivery_rate, 66.67);
    }

    #[test]
    fn unique_opens_dedupe_by_email() {
        let events = vec![
            event(EventType::Sent, "a@b.com", at(9, 0)),
            event(EventType::Opened, "a@b.com", at(9, 5)),
            event(EventType::Opened, "a@b.com", at(9, 6)),
        ];
        let report = stats(&events);
        assert_eq!(report.opened, 2);
        assert_eq!(report.unique_opens, 1);
        assert_eq!(report.open_rate, 100.0);
    }

    #[test]
    fn rates_round_to_two_decimals() {
        let mut events: Vec<EmailEvent> = (0..3)
            .map(|i| event(EventType::Sent, &format!("r{i}@b.com"), at(9, 0)))
            .collect();
        events.push(event(EventType::Opened, "r0@b.com", at(9, 1)));
        events.push(event(EventType::Bounced, "r1@b.com", at(9, 1)));
        events.push(event(EventType::Unsubscribed, "r2@b.com", at(9, 2)));
        events.push(event(EventType::Clicked, "r0@b.com", at(9, 3)));
        let report = stats(&events);
        assert_eq!(report.open_rate, 33.33);
        assert_eq!(report.click_rate, 33.33);
        assert_eq!(report.bounce_rate, 33.33);
        assert_eq!(report.unsubscribe_rate, 33.33);
    }

    #[test]
    fn rates_never_exceed_one_hundred() {
        let events = vec![
            event(EventType::Sent, "a@b.com", at(9, 0)),
            event(EventType::Opened, "a@b.com", at(9, 1)),
            event(EventType::Opened, "b@b.com", at(9, 1)),
            event(EventType::Opened, "c@b.com", at(9, 1)),
        ];
        let report = stats(&events);
        assert_eq!(report.unique_opens, 3);
        assert_eq!(report.open_rate, 100.0);
    }

    #[test]
    fn timeline_buckets_are_hourly_and_sorted() {
        let events = vec![
            event(EventType::Opened, "a@b.com", at(11, 45)),
            event(EventType::Sent, "a@b.com", at(9, 10)),
            event(EventType::Sent, "b@b.com", at(9, 59)),
            event(EventType::Clicked, "a@b.com", at(11, 0)),
            event(EventType::Delivered, "a@b.com", at(9, 30)),
        ];
        let report = stats(&events);
        let hours: Vec<DateTime<Utc>> = report.timeline.iter().map(|b| b.hour).collect();
        assert_eq!(hours, vec![at(9, 0), at(11, 0)]);

        let Some(first) = report.timeline.first() else {
            panic!("missing bucket");
        };
        assert_eq!(first.sent, 2);
        assert_eq!(first.opened, 0);
        assert_eq!(first.total, 3);

        let Some(second) = report.timeline.get(1) else {
            panic!("missing bucket");
        };
        assert_eq!(second.opened, 1);
        assert_eq!(second.clicked, 1);
        assert_eq!(second.total, 2);
    }

    #[test]
    fn top_links_sorted_and_capped() {
        let mut events = Vec::new();
        for i in 0..12 {
            for _ in 0..=i {
                events.push(with_meta(
                    event(EventType::Clicked, "a@b.com", at(9, 0)),
                    META_CLICKED_URL,
                    &format!("https://listing.example/{i}"),
                ));
            }
        }
        let report = stats(&events);
        assert_eq!(report.top_links.len(), 10);
        assert!(report.top_links.windows(2).all(|w| match w {
            [a, b] => a.clicks >= b.clicks,
            _ => true,
        }));
        assert_eq!(
            report.top_links.first().map(|l| l.url.as_str()),
            Some("https://listing.example/11")
        );
    }

    #[test]
    fn top_links_ties_keep_first_seen_order() {
        let events = vec![
            with_meta(event(EventType::Clicked, "a@b.com", at(9, 0)), META_CLICKED_URL, "https://b"),
            with_meta(event(EventType::Clicked, "a@b.com", at(9, 0)), META_CLICKED_URL, "https://a"),
            // Non-click events with a URL are ignored.
            with_meta(event(EventType::Opened, "a@b.com", at(9, 0)), META_CLICKED_URL, "https://a"),
            event(EventType::Clicked, "a@b.com", at(9, 0)),
        ];
        let report = stats(&events);
        let urls: Vec<&str> = report.top_links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://b", "https://a"]);
        assert!(report.top_links.iter().all(|l| l.clicks == 1));
    }

    #[test]
    fn classify_follows_rule_priority() {
        assert_eq!(classify_user_agent("Mozilla/5.0 (iPhone) Mobile Safari"), DeviceClass::Mobile);
        assert_eq!(classify_user_agent("Tablet Mobile hybrid"), DeviceClass::Mobile);
        assert_eq!(classify_user_agent("Android Tablet"), DeviceClass::Tablet);
        assert_eq!(classify_user_agent("Desktop Chrome"), DeviceClass::Desktop);
        assert_eq!(classify_user_agent("Email Client"), DeviceClass::EmailClient);
        assert_eq!(classify_user_agent("curl/8.0"), DeviceClass::Unknown);
    }

    #[test]
    fn device_stats_sorted_descending() {
        let events = vec![
            with_meta(event(EventType::Opened, "a@b.com", at(9, 0)), META_USER_AGENT, "Desktop"),
            with_meta(event(EventType::Opened, "b@b.com", at(9, 0)), META_USER_AGENT, "Email Client"),
            with_meta(event(EventType::Opened, "c@b.com", at(9, 0)), META_USER_AGENT, "Email Client"),
            event(EventType::Opened, "d@b.com", at(9, 0)),
        ];
        let report = stats(&events);
        assert_eq!(
            report.device_stats,
            vec![
                DeviceStat {
                    device: DeviceClass::EmailClient,
                    count: 2
                },
                DeviceStat {
                    device: DeviceClass::Desktop,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn device_class_serializes_display_label() {
        let json = serde_json::to_string(&DeviceClass::EmailClient).unwrap_or_default();
        assert_eq!(json, "\"Email Client\"");
    }

    #[test]
    fn duration_and_last_activity_use_event_time() {
        let events = vec![
            event(EventType::Sent, "a@b.com", at(10, 0)),
            event(EventType::Opened, "a@b.com", at(12, 30)),
            event(EventType::Sent, "b@b.com", at(9, 0)),
        ];
        let report = stats(&events);
        assert_eq!(report.campaign_duration, 3 * 3_600_000 + 30 * 60_000);
        assert_eq!(report.last_activity, Some(at(9, 0)));
    }

    #[test]
    fn total_recipients_comes_from_campaign() {
        let campaign = Campaign::new(
            cid(),
            CampaignUpdate {
                total_recipients: Some(320),
                ..CampaignUpdate::default()
            },
        );
        let report = aggregate(&[], Some(&campaign), &StatsOptions::default());
        assert_eq!(report.total_recipients, 320);
    }

    #[test]
    fn summary_uses_unique_counts() {
        let events = vec![
            event(EventType::Sent, "a@b.com", at(9, 0)),
            event(EventType::Opened, "a@b.com", at(9, 1)),
            event(EventType::Opened, "a@b.com", at(9, 2)),
        ];
        let summary = CampaignSummaryStats::from(&stats(&events));
        assert_eq!(summary.opened, 1);
        assert_eq!(summary.open_rate, 100.0);
    }
}
