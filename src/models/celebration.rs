// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Celebration feed entries and weekly check-ins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// What kind of point-earning event a celebration records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum CelebrationKind {
    Courage,
    Support,
    Milestone,
    TriedAgain,
}

/// Append-only record of a point-earning event.
///
/// Advisory only: the user's `points` total is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Celebration {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: CelebrationKind,
    pub description: String,
    pub points: u32,
    #[serde(with = "crate::time_utils::fixed_rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

/// Self-reported mood for a weekly check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Mood {
    Great,
    Good,
    Okay,
    Tough,
    #[serde(rename = "Very Tough")]
    VeryTough,
}

/// Append-only weekly check-in in the `weekly_checkins` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeeklyCheckin {
    pub id: String,
    pub user_id: String,
    pub mood: Mood,
    pub accomplishment: Option<String>,
    pub need_support: Option<String>,
    #[serde(with = "crate::time_utils::fixed_rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

/// Payload for `POST /api/users/{id}/checkin`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCheckin {
    pub mood: Mood,
    #[validate(length(max = 1000))]
    pub accomplishment: Option<String>,
    #[validate(length(max = 1000))]
    pub need_support: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_wire_names() {
        let mood: Mood = serde_json::from_str("\"Very Tough\"").unwrap();
        assert_eq!(mood, Mood::VeryTough);
        assert_eq!(serde_json::to_string(&Mood::Okay).unwrap(), "\"Okay\"");
        assert!(serde_json::from_str::<Mood>("\"Meh\"").is_err());
    }

    #[test]
    fn test_celebration_kind_serializes_as_type() {
        let c = Celebration {
            id: "c1".to_string(),
            user_id: "u1".to_string(),
            kind: CelebrationKind::TriedAgain,
            description: "Tried again after a setback!".to_string(),
            points: 50,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["type"], "tried_again");
        assert_eq!(value["userId"], "u1");
    }
}
