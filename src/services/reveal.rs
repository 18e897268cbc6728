// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mutual profile reveal.
//!
//! Partners chat under generated usernames. A member's external profile is
//! disclosed only once every member of the match has opted in.

use std::sync::Arc;

use serde::Serialize;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{ChatRoom, Match, RevealState};

/// Profile fields disclosed after a full reveal.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartnerProfile {
    pub user_id: String,
    pub username: String,
    pub linkedin_url: Option<String>,
}

/// Room as seen by one of its members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetail {
    #[serde(flatten)]
    pub room: ChatRoom,
    /// All member ids of the match
    pub members: Vec<String>,
    pub partner_usernames: Vec<String>,
    pub profiles_revealed: Vec<String>,
    pub all_profiles_revealed: bool,
    pub reveal_state: RevealState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_profiles: Option<Vec<PartnerProfile>>,
}

#[derive(Clone)]
pub struct RevealService {
    db: Arc<dyn Store>,
}

impl RevealService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// Record that `user_id` agrees to reveal their profile in `match_id`.
    ///
    /// Repeating the opt-in changes nothing. Only members may opt in.
    pub async fn opt_in(&self, match_id: &str, user_id: &str) -> Result<Match> {
        let existing = self
            .db
            .get_match(match_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))?;
        if !existing.is_member(user_id) {
            return Err(AppError::Forbidden(format!(
                "User {} is not a member of match {}",
                user_id, match_id
            )));
        }

        let mutation = self
            .db
            .add_reveal(match_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))?;

        if mutation.changed {
            tracing::info!(
                match_id,
                user_id,
                state = ?mutation.record.reveal_state(),
                "Profile reveal opt-in recorded"
            );
        }
        Ok(mutation.record)
    }

    /// Room detail for `viewer`, or for an anonymous caller when `None`.
    ///
    /// Partner usernames are always included. Partner profiles appear only
    /// when every member has opted in.
    pub async fn room_detail(&self, room_id: &str, viewer: Option<&str>) -> Result<RoomDetail> {
        let room = self
            .db
            .get_room(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Chat room {} not found", room_id)))?;
        let m = self
            .db
            .get_match(&room.match_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", room.match_id)))?;

        let partner_ids: Vec<&String> = match viewer {
            Some(viewer) => m.partners_of(viewer).collect(),
            None => m.user_ids.iter().collect(),
        };

        let mut partners = Vec::with_capacity(partner_ids.len());
        for id in partner_ids {
            // A deleted partner simply drops out of the detail.
            if let Some(user) = self.db.get_user(id).await? {
                partners.push(user);
            }
        }

        let all_revealed = m.all_profiles_revealed();
        let partner_profiles = all_revealed.then(|| {
            partners
                .iter()
                .map(|u| PartnerProfile {
                    user_id: u.id.clone(),
                    username: u.username.clone(),
                    linkedin_url: u.linkedin_url.clone(),
                })
                .collect()
        });

        Ok(RoomDetail {
            partner_usernames: partners.into_iter().map(|u| u.username).collect(),
            reveal_state: m.reveal_state(),
            members: m.user_ids,
            profiles_revealed: m.profiles_revealed,
            all_profiles_revealed: all_revealed,
            partner_profiles,
            room,
        })
    }
}
