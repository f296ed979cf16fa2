//! Domain layer: campaign and event types, the in-memory store, the stats
//! aggregator, and the activity bus.

pub mod campaign;
pub mod campaign_id;
pub mod campaign_store;
pub mod email_event;
pub mod event_bus;
pub mod stats;
pub mod tracking_event;

pub use campaign::{Campaign, CampaignStatus, CampaignUpdate};
pub use campaign_id::CampaignId;
pub use campaign_store::CampaignStore;
pub use email_event::{EmailEvent, EventMetadata, EventType};
pub use event_bus::EventBus;
pub use stats::{CampaignStats, CampaignSummaryStats, DeliveryPolicy, StatsOptions};
pub use tracking_event::TrackingEvent;
