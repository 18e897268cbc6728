// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat room, message and challenge routes.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::db::new_id;
use crate::error::{AppError, Result};
use crate::models::{Badge, Challenge, Message, NewMessage};
use crate::routes::extract::{UserRef, ValidatedJson};
use crate::services::{Award, RoomDetail};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chat/{room_id}/room", get(get_room))
        .route(
            "/api/chat/{room_id}/messages",
            get(list_messages).post(send_message),
        )
        .route("/api/chat/{room_id}/challenge", get(current_challenge))
        .route("/api/challenges/{id}/complete", post(complete_challenge))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuery {
    /// Viewer; excluded from the partner lists when given
    pub user_id: Option<String>,
}

async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<RoomQuery>,
) -> Result<Json<RoomDetail>> {
    let detail = state
        .reveal
        .room_detail(&room_id, query.user_id.as_deref())
        .await?;
    Ok(Json(detail))
}

async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<Message>>> {
    if state.db.get_room(&room_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Chat room {} not found", room_id)));
    }
    Ok(Json(state.db.messages_for_room(&room_id).await?))
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<NewMessage>,
) -> Result<Json<Message>> {
    if state.db.get_room(&room_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Chat room {} not found", room_id)));
    }
    let sender = state
        .db
        .get_user(&payload.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", payload.user_id)))?;

    let message = Message {
        id: new_id(),
        chat_room_id: room_id,
        user_id: sender.id,
        username: sender.username,
        content: payload.content,
        created_at: chrono::Utc::now(),
    };
    state.db.create_message(&message).await?;
    tracing::debug!(
        room_id = %message.chat_room_id,
        user_id = %message.user_id,
        "Message stored"
    );
    Ok(Json(message))
}

/// Most recent challenge for the room, or `null`.
async fn current_challenge(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<Option<Challenge>>> {
    Ok(Json(state.db.latest_challenge(&room_id).await?))
}

/// Mark a challenge complete. Points are granted only on a user's first completion.
async fn complete_challenge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UserRef>,
) -> Result<Json<Challenge>> {
    let user_id = payload.user_id;
    if state.db.get_user(&user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    let mutation = state
        .db
        .complete_challenge(&id, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Challenge {} not found", id)))?;

    if mutation.changed {
        tracing::info!(challenge_id = %id, user_id = %user_id, "Challenge completed");
        state.ledger.award(&user_id, Award::COMPLETE_CHALLENGE).await?;
        state.ledger.grant_badge(&user_id, Badge::ActionTaker).await?;
    }
    Ok(Json(mutation.record))
}
