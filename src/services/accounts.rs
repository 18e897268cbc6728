// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User registration.

use anyhow::anyhow;

use crate::db::{new_id, Store};
use crate::error::{AppError, Result};
use crate::models::user::generate_username;
use crate::models::{NewUser, User};

/// Generated names that collide are retried this many times.
const USERNAME_ATTEMPTS: usize = 10;

/// Create a user from an onboarding payload.
///
/// A client-chosen username must be free; otherwise one is generated.
pub async fn register(db: &dyn Store, payload: NewUser) -> Result<User> {
    let username = match payload.username.as_deref().map(str::trim) {
        Some(chosen) if !chosen.is_empty() => {
            if db.get_user_by_username(chosen).await?.is_some() {
                return Err(AppError::BadRequest(format!(
                    "Username {} is already taken",
                    chosen
                )));
            }
            chosen.to_string()
        }
        _ => unused_username(db).await?,
    };

    let user = payload.into_user(new_id(), username, chrono::Utc::now());
    db.create_user(&user).await?;

    tracing::info!(
        user_id = %user.id,
        username = %user.username,
        category = %user.category,
        failures = user.failures.len(),
        "User created"
    );
    Ok(user)
}

async fn unused_username(db: &dyn Store) -> Result<String> {
    for _ in 0..USERNAME_ATTEMPTS {
        let candidate = generate_username(&mut rand::thread_rng());
        if db.get_user_by_username(&candidate).await?.is_none() {
            return Ok(candidate);
        }
        tracing::debug!(candidate = %candidate, "Generated username taken, retrying");
    }
    Err(AppError::Internal(anyhow!(
        "No free username after {} attempts",
        USERNAME_ATTEMPTS
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn payload(username: Option<&str>) -> NewUser {
        NewUser {
            username: username.map(str::to_string),
            category: Some("Job Search".to_string()),
            goal: "Land a PM role".to_string(),
            failures: vec![" Burnout ".to_string()],
            failure_description: None,
            severity: Some(3),
            learning_style: None,
            availability: None,
            accountability_style: None,
            linkedin_url: None,
        }
    }

    #[tokio::test]
    async fn test_register_generates_username() {
        let db = MemoryStore::new();
        let user = register(&db, payload(None)).await.unwrap();
        assert_eq!(user.username.split('_').count(), 3);
        assert_eq!(user.failures, vec!["Burnout"]);
        assert_eq!(user.points, 0);
        assert!(db.get_user(&user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_register_rejects_taken_username() {
        let db = MemoryStore::new();
        register(&db, payload(Some("Steady_Anchor_1234"))).await.unwrap();
        let err = register(&db, payload(Some("Steady_Anchor_1234")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
