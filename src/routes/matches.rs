// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Matchmaking and profile reveal routes.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::Result;
use crate::models::Match;
use crate::routes::extract::{UserRef, ValidatedJson};
use crate::services::MatchView;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    // `{id}` is a user id on the list route and a match id on reveal.
    Router::new()
        .route("/api/matches/find", post(find_match))
        .route("/api/matches/{id}", get(list_matches))
        .route("/api/matches/{id}/reveal", post(reveal_profile))
}

/// Active matches for a user, newest first, each with its room.
async fn list_matches(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<MatchView>>> {
    Ok(Json(state.matchmaker.matches_with_rooms(&user_id).await?))
}

async fn find_match(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<UserRef>,
) -> Result<Json<MatchView>> {
    Ok(Json(state.matchmaker.find_match(&payload.user_id).await?))
}

async fn reveal_profile(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UserRef>,
) -> Result<Json<Match>> {
    Ok(Json(state.reveal.opt_in(&match_id, &payload.user_id).await?))
}
