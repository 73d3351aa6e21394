//! Aggregate turnout snapshot computed by the Registry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::serde_helpers::number_or_string;

/// Body of `GET /api/voters/stats`.
///
/// Every number here is server-computed; the client displays, never recomputes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterStats {
    pub total: u64,
    pub voted: u64,
    pub not_voted: u64,
    /// Sent as `"42.50"` or `42.5` depending on the server build.
    #[serde(deserialize_with = "number_or_string")]
    pub voting_percentage: f64,
    #[serde(default)]
    pub by_gender: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_age_group: Vec<AgeGroup>,
    #[serde(default)]
    pub voting_by_gender: BTreeMap<String, GenderTurnout>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeGroup {
    pub range: String,
    pub count: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderTurnout {
    pub voted: u64,
    pub not_voted: u64,
}

impl VoterStats {
    pub fn male_count(&self) -> u64 {
        self.by_gender.get("Male").copied().unwrap_or(0)
    }

    pub fn female_count(&self) -> u64 {
        self.by_gender.get("Female").copied().unwrap_or(0)
    }

    /// Turnout percentage clamped to 0..=100 for progress bars.
    pub fn turnout_for_display(&self) -> f64 {
        if self.voting_percentage.is_finite() {
            self.voting_percentage.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}
