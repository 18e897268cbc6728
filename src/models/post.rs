// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed post model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// A shared failure in the `posts` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Post {
    pub id: String,
    /// Author
    pub user_id: String,
    /// Author display name at the time of posting
    pub username: String,
    pub category: Option<String>,
    pub content: String,
    pub severity: Option<u8>,
    /// Number of distinct users who encouraged this post
    #[serde(default)]
    pub encouragements: u32,
    /// Users who already encouraged this post
    #[serde(default)]
    pub encouraged_by: Vec<String>,
    #[serde(with = "crate::time_utils::fixed_rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

/// Payload for `POST /api/posts`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    #[validate(length(min = 1, max = 80))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    #[validate(range(min = 1, max = 5))]
    pub severity: Option<u8>,
}

impl NewPost {
    pub fn into_post(self, id: String, username: String, now: DateTime<Utc>) -> Post {
        Post {
            id,
            user_id: self.user_id,
            username,
            category: self.category,
            content: self.content,
            severity: self.severity,
            encouragements: 0,
            encouraged_by: Vec::new(),
            created_at: now,
        }
    }
}
