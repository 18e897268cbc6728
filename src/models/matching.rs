// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Match and chat room models.
//!
//! A match and its room reference each other. Both ids are generated before
//! either document is written, so a room never carries a placeholder match id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Category used when matched users share no failure tag.
pub const DEFAULT_MATCH_CATEGORY: &str = "General";

/// An accountability pairing stored in the `matches` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Match {
    pub id: String,
    /// Members, fixed at creation
    pub user_ids: Vec<String>,
    /// Shared failure tag (or category) the pair was matched on
    pub category: String,
    pub chat_room_id: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Members who opted in to revealing their profile
    #[serde(default)]
    pub profiles_revealed: Vec<String>,
    #[serde(with = "crate::time_utils::fixed_rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Progress of the mutual profile reveal for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealState {
    NoneRevealed,
    PartiallyRevealed,
    FullyRevealed,
}

impl Match {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.user_ids.iter().any(|id| id == user_id)
    }

    /// Members other than `user_id`.
    pub fn partners_of<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.user_ids.iter().filter(move |id| id.as_str() != user_id)
    }

    /// True iff every member has opted in.
    pub fn all_profiles_revealed(&self) -> bool {
        !self.user_ids.is_empty()
            && self
                .user_ids
                .iter()
                .all(|id| self.profiles_revealed.contains(id))
    }

    pub fn reveal_state(&self) -> RevealState {
        if self.all_profiles_revealed() {
            RevealState::FullyRevealed
        } else if self.profiles_revealed.iter().any(|id| self.is_member(id)) {
            RevealState::PartiallyRevealed
        } else {
            RevealState::NoneRevealed
        }
    }
}

/// Chat room backing a match, stored in the `chat_rooms` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChatRoom {
    pub id: String,
    pub match_id: String,
    /// Generated name, e.g. "The Resilient Guild"
    pub room_name: String,
    #[serde(with = "crate::time_utils::fixed_rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(revealed: &[&str]) -> Match {
        Match {
            id: "m1".to_string(),
            user_ids: vec!["A".to_string(), "B".to_string()],
            category: "Burnout".to_string(),
            chat_room_id: "r1".to_string(),
            is_active: true,
            profiles_revealed: revealed.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_reveal_states() {
        assert_eq!(pair(&[]).reveal_state(), RevealState::NoneRevealed);
        assert_eq!(pair(&["A"]).reveal_state(), RevealState::PartiallyRevealed);
        assert_eq!(pair(&["B", "A"]).reveal_state(), RevealState::FullyRevealed);
    }

    #[test]
    fn test_all_profiles_revealed_requires_set_equality() {
        assert!(!pair(&["A"]).all_profiles_revealed());
        assert!(pair(&["A", "B"]).all_profiles_revealed());
    }

    #[test]
    fn test_partners_of_excludes_self() {
        let m = pair(&[]);
        let partners: Vec<&String> = m.partners_of("A").collect();
        assert_eq!(partners, vec!["B"]);
    }

    #[test]
    fn test_missing_active_flag_defaults_true() {
        let json = r#"{
            "id": "m1",
            "userIds": ["A", "B"],
            "category": "General",
            "chatRoomId": "r1",
            "createdAt": "2026-01-01T00:00:00.000000Z"
        }"#;
        let m: Match = serde_json::from_str(json).unwrap();
        assert!(m.is_active);
        assert!(m.profiles_revealed.is_empty());
    }
}
