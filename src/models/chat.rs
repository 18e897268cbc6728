// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat message and room challenge models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Minutes a generated challenge is expected to take.
pub const DEFAULT_CHALLENGE_MINUTES: u32 = 30;

/// Append-only chat message in the `messages` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Message {
    pub id: String,
    pub chat_room_id: String,
    /// Sender
    pub user_id: String,
    /// Sender display name at send time
    pub username: String,
    pub content: String,
    #[serde(with = "crate::time_utils::fixed_rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

/// Payload for `POST /api/chat/{room_id}/messages`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    #[validate(length(min = 1, max = 4096))]
    pub content: String,
}

/// Shared activity issued to a room, stored in the `challenges` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Challenge {
    pub id: String,
    pub chat_room_id: String,
    pub challenge: String,
    /// Estimated duration in minutes
    pub estimated_time: u32,
    /// Users who marked the challenge complete, at most once each
    #[serde(default)]
    pub completed_by: Vec<String>,
    #[serde(with = "crate::time_utils::fixed_rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}
