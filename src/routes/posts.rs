// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed routes: sharing failures and encouraging others.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::db::new_id;
use crate::error::{AppError, Result};
use crate::models::{Badge, NewPost, Post};
use crate::routes::extract::{UserRef, ValidatedJson};
use crate::services::Award;
use crate::AppState;

/// Posts returned by the feed.
const FEED_SIZE: usize = 50;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route("/api/posts/{id}/encourage", post(encourage_post))
}

/// A new post with generated support copy for its author.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostResponse {
    #[serde(flatten)]
    pub post: Post,
    pub ai_support: String,
}

/// An encouraged post with a generated encouragement message.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncourageResponse {
    #[serde(flatten)]
    pub post: Post,
    pub ai_encouragement: String,
}

async fn list_posts(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Post>>> {
    Ok(Json(state.db.recent_posts(FEED_SIZE).await?))
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<NewPost>,
) -> Result<Json<CreatePostResponse>> {
    let author = state
        .db
        .get_user(&payload.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", payload.user_id)))?;

    let post = payload.into_post(new_id(), author.username, chrono::Utc::now());
    state.db.create_post(&post).await?;
    tracing::info!(post_id = %post.id, user_id = %post.user_id, "Post created");

    state.ledger.award(&post.user_id, Award::POST_FAILURE).await?;
    state.ledger.grant_badge(&post.user_id, Badge::Courage).await?;

    let ai_support = state.content.support_response(&post.content).await;
    Ok(Json(CreatePostResponse { post, ai_support }))
}

/// Encourage a post. Points are granted only on a user's first encouragement.
async fn encourage_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UserRef>,
) -> Result<Json<EncourageResponse>> {
    let encourager = payload.user_id;
    if state.db.get_user(&encourager).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", encourager)));
    }

    let mutation = state
        .db
        .encourage_post(&id, &encourager)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    if mutation.changed {
        tracing::info!(
            post_id = %id,
            user_id = %encourager,
            encouragements = mutation.record.encouragements,
            "Post encouraged"
        );
        state
            .ledger
            .award(&encourager, Award::GIVE_ENCOURAGEMENT)
            .await?;
        state.ledger.grant_badge(&encourager, Badge::Supporter).await?;

        match state
            .ledger
            .award(&mutation.record.user_id, Award::RECEIVE_ENCOURAGEMENT)
            .await
        {
            Ok(_) => {}
            Err(AppError::NotFound(_)) => {
                tracing::debug!(post_id = %id, "Post author missing, no points to receive")
            }
            Err(e) => return Err(e),
        }
    } else {
        tracing::debug!(post_id = %id, user_id = %encourager, "Repeat encouragement ignored");
    }

    let ai_encouragement = state.content.encouragement(&mutation.record.content).await;
    Ok(Json(EncourageResponse {
        post: mutation.record,
        ai_encouragement,
    }))
}
