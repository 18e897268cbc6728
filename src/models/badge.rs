// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Badge vocabulary.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Badge keys a user can earn. Stored as snake_case strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Badge {
    /// First failure posted
    Courage,
    Supporter,
    /// Joined an accountability room
    Connector,
    /// Completed a challenge
    ActionTaker,
    /// Declared "tried again"
    Phoenix,
    RisingStar,
    Consistent,
}

impl Badge {
    pub const ALL: [Badge; 7] = [
        Badge::Courage,
        Badge::Supporter,
        Badge::Connector,
        Badge::ActionTaker,
        Badge::Phoenix,
        Badge::RisingStar,
        Badge::Consistent,
    ];

    /// Stored key, e.g. `action_taker`.
    pub fn key(self) -> &'static str {
        match self {
            Badge::Courage => "courage",
            Badge::Supporter => "supporter",
            Badge::Connector => "connector",
            Badge::ActionTaker => "action_taker",
            Badge::Phoenix => "phoenix",
            Badge::RisingStar => "rising_star",
            Badge::Consistent => "consistent",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Badge::Courage => "Courage Badge",
            Badge::Supporter => "Supporter Badge",
            Badge::Connector => "Connector Badge",
            Badge::ActionTaker => "Action Taker Badge",
            Badge::Phoenix => "Phoenix Badge",
            Badge::RisingStar => "Rising Star Badge",
            Badge::Consistent => "Consistency Badge",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Badge::Courage => "Posted your first failure",
            Badge::Supporter => "Encouraged someone for the first time",
            Badge::Connector => "Joined your first chat room",
            Badge::ActionTaker => "Completed first challenge",
            Badge::Phoenix => "Tried again after failure",
            Badge::RisingStar => "Reached 100 points",
            Badge::Consistent => "Completed 3 weekly check-ins",
        }
    }
}

impl std::fmt::Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_key_matches_key() {
        for badge in Badge::ALL {
            let json = serde_json::to_string(&badge).unwrap();
            assert_eq!(json, format!("\"{}\"", badge.key()));
        }
    }
}
