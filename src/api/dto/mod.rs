//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names are camelCase on the wire to match the tracking links
//! already embedded in sent emails.

pub mod campaign_dto;
pub mod common_dto;
pub mod tracking_dto;

pub use campaign_dto::*;
pub use common_dto::*;
pub use tracking_dto::*;
