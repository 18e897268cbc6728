// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User, ledger and check-in routes.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::db::new_id;
use crate::error::{AppError, Result};
use crate::models::{Badge, Celebration, NewCheckin, NewUser, User, WeeklyCheckin};
use crate::routes::extract::ValidatedJson;
use crate::services::{accounts, Award};
use crate::AppState;

const LEADERBOARD_SIZE: usize = 20;
const CELEBRATION_FEED_SIZE: usize = 20;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", get(get_user))
        .route("/api/users/{id}/tried-again", post(tried_again))
        .route("/api/users/{id}/checkin", post(checkin))
        .route("/api/users/{id}/checkins", get(list_checkins))
        .route("/api/users/{id}/celebrations", get(list_celebrations))
        .route("/api/generate-failures", post(generate_failures))
        .route("/api/leaderboard", get(leaderboard))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<NewUser>,
) -> Result<Json<User>> {
    let user = accounts::register(state.db.as_ref(), payload).await?;
    Ok(Json(user))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    let user = state
        .db
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
    Ok(Json(user))
}

/// The user declares they tried again after a setback.
async fn tried_again(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    state.ledger.award(&id, Award::TRIED_AGAIN).await?;
    let user = state
        .ledger
        .grant_badge(&id, Badge::Phoenix)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
    Ok(Json(user))
}

async fn checkin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<NewCheckin>,
) -> Result<Json<WeeklyCheckin>> {
    if state.db.touch_user(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", id)));
    }

    let checkin = WeeklyCheckin {
        id: new_id(),
        user_id: id.clone(),
        mood: payload.mood,
        accomplishment: payload.accomplishment,
        need_support: payload.need_support,
        created_at: chrono::Utc::now(),
    };
    state.db.create_checkin(&checkin).await?;
    state.ledger.award(&id, Award::WEEKLY_CHECKIN).await?;

    tracing::info!(user_id = %id, mood = ?checkin.mood, "Weekly check-in recorded");
    Ok(Json(checkin))
}

async fn list_checkins(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<WeeklyCheckin>>> {
    Ok(Json(state.db.checkins_for_user(&id).await?))
}

async fn list_celebrations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Celebration>>> {
    Ok(Json(
        state
            .db
            .recent_celebrations(&id, CELEBRATION_FEED_SIZE)
            .await?,
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateFailuresRequest {
    #[validate(length(min = 1, max = 500))]
    pub goal: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GenerateFailuresResponse {
    pub failures: Vec<String>,
}

/// Suggest likely setbacks for an onboarding goal.
async fn generate_failures(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<GenerateFailuresRequest>,
) -> Json<GenerateFailuresResponse> {
    let failures = state.content.goal_failures(&payload.goal).await;
    Json(GenerateFailuresResponse { failures })
}

async fn leaderboard(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>> {
    Ok(Json(state.db.leaderboard(LEADERBOARD_SIZE).await?))
}
