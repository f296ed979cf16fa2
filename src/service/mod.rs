//! Service layer: business logic orchestration.
//!
//! [`TrackingService`] coordinates campaign and event operations on the
//! [`super::domain::CampaignStore`] and emits activity through the
//! [`super::domain::EventBus`].

pub mod tracking_service;

pub use tracking_service::{CampaignReport, TrackingService};
