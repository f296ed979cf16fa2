//! WebSocket layer: live feed of tracking activity.
//!
//! The endpoint at `/ws` lets dashboards subscribe to campaigns and
//! receive every recorded event and campaign change as it happens.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
