//! Type-safe campaign identifier.
//!
//! [`CampaignId`] is a newtype wrapper around a caller-chosen string so that
//! campaign keys cannot be confused with recipient addresses or event IDs.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::TrackerError;

/// Unique identifier for an email campaign.
///
/// Campaign IDs are chosen by the caller (they travel inside tracking
/// links and pixel URLs), so the only requirement is that they are
/// non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CampaignId(String);

impl CampaignId {
    /// Parses a campaign ID, rejecting empty or whitespace-only input.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidRequest`] when `raw` is blank.
    pub fn parse(raw: &str) -> Result<Self, TrackerError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TrackerError::InvalidRequest(
                "campaignId must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_whitespace() {
        let Ok(id) = CampaignId::parse("  spring-open-house ") else {
            panic!("valid id");
        };
        assert_eq!(id.as_str(), "spring-open-house");
    }

    #[test]
    fn parse_rejects_blank() {
        assert!(CampaignId::parse("").is_err());
        assert!(CampaignId::parse("   ").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let Ok(id) = CampaignId::parse("c1") else {
            panic!("valid id");
        };
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"c1\"");
    }

    #[test]
    fn hash_works_in_hashmap() {
        use std::collections::HashMap;
        let Ok(id) = CampaignId::parse("c1") else {
            panic!("valid id");
        };
        let mut map = HashMap::new();
        map.insert(id.clone(), "test");
        assert_eq!(map.get(&id), Some(&"test"));
    }
}
