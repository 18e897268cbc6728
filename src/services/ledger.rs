// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Points and badges ledger.
//!
//! The user's `points` total is authoritative. Celebrations are a separate,
//! advisory feed written after the points; if that second write fails the
//! points stay credited and the failure is only logged.

use std::sync::Arc;

use crate::db::{new_id, Store};
use crate::error::{AppError, Result};
use crate::models::{Badge, Celebration, CelebrationKind, User};

/// Fixed point values per action.
pub mod points {
    pub const POST_FAILURE: u32 = 10;
    pub const RECEIVE_ENCOURAGEMENT: u32 = 2;
    pub const GIVE_ENCOURAGEMENT: u32 = 5;
    pub const COMPLETE_CHALLENGE: u32 = 20;
    pub const TRIED_AGAIN: u32 = 50;
    pub const WEEKLY_CHECKIN: u32 = 15;
}

/// A point-earning event worth recording in the celebration feed.
#[derive(Debug, Clone, Copy)]
pub struct Award {
    pub points: u32,
    pub kind: CelebrationKind,
    pub description: &'static str,
}

impl Award {
    pub const POST_FAILURE: Award = Award {
        points: points::POST_FAILURE,
        kind: CelebrationKind::Courage,
        description: "Shared a setback with the community",
    };
    pub const GIVE_ENCOURAGEMENT: Award = Award {
        points: points::GIVE_ENCOURAGEMENT,
        kind: CelebrationKind::Support,
        description: "Encouraged someone through a setback",
    };
    pub const RECEIVE_ENCOURAGEMENT: Award = Award {
        points: points::RECEIVE_ENCOURAGEMENT,
        kind: CelebrationKind::Support,
        description: "Received encouragement from the community",
    };
    pub const COMPLETE_CHALLENGE: Award = Award {
        points: points::COMPLETE_CHALLENGE,
        kind: CelebrationKind::Milestone,
        description: "Completed a daily challenge",
    };
    pub const TRIED_AGAIN: Award = Award {
        points: points::TRIED_AGAIN,
        kind: CelebrationKind::TriedAgain,
        description: "Tried again after a setback!",
    };
    pub const WEEKLY_CHECKIN: Award = Award {
        points: points::WEEKLY_CHECKIN,
        kind: CelebrationKind::Milestone,
        description: "Completed a weekly check-in",
    };
}

/// Grants points, badges, and celebration entries.
#[derive(Clone)]
pub struct Ledger {
    db: Arc<dyn Store>,
}

impl Ledger {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// Add `amount` to the user's total.
    ///
    /// Grants accumulate: two grants of 10 add 20. Returns `None` without
    /// writing anything if the user does not exist.
    pub async fn grant_points(&self, user_id: &str, amount: u32) -> Result<Option<User>> {
        let updated = self.db.increment_points(user_id, amount).await?;
        match &updated {
            Some(user) => tracing::info!(
                user_id,
                amount,
                total = user.points,
                "Points granted"
            ),
            None => tracing::debug!(user_id, amount, "Points not granted, user missing"),
        }
        Ok(updated)
    }

    /// Give the user `badge` unless they already have it.
    pub async fn grant_badge(&self, user_id: &str, badge: Badge) -> Result<Option<User>> {
        let Some(mutation) = self.db.add_badge(user_id, badge).await? else {
            tracing::debug!(user_id, %badge, "Badge not granted, user missing");
            return Ok(None);
        };
        if mutation.changed {
            tracing::info!(user_id, %badge, "Badge granted");
        }
        Ok(Some(mutation.record))
    }

    /// Grant the award's points, then record a celebration for it.
    ///
    /// Fails with `NotFound` if the user does not exist.
    pub async fn award(&self, user_id: &str, award: Award) -> Result<User> {
        let user = self
            .grant_points(user_id, award.points)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        self.celebrate(user_id, award).await;
        Ok(user)
    }

    async fn celebrate(&self, user_id: &str, award: Award) {
        let celebration = Celebration {
            id: new_id(),
            user_id: user_id.to_string(),
            kind: award.kind,
            description: award.description.to_string(),
            points: award.points,
            created_at: chrono::Utc::now(),
        };
        if let Err(e) = self.db.create_celebration(&celebration).await {
            tracing::warn!(
                user_id,
                points = award.points,
                error = %e,
                "Failed to record celebration; points already credited"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::user::NewUser;

    async fn ledger_with_user(id: &str) -> (Ledger, Arc<dyn Store>) {
        let db: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let user = NewUser {
            username: None,
            category: None,
            goal: "Finish my thesis".to_string(),
            failures: vec!["Thesis rejected".to_string()],
            failure_description: None,
            severity: None,
            learning_style: None,
            availability: None,
            accountability_style: None,
            linkedin_url: None,
        }
        .into_user(id.to_string(), "Calm_River_1000".to_string(), chrono::Utc::now());
        db.create_user(&user).await.unwrap();
        (Ledger::new(db.clone()), db)
    }

    #[tokio::test]
    async fn test_grants_accumulate() {
        let (ledger, _) = ledger_with_user("u1").await;
        ledger.grant_points("u1", 10).await.unwrap();
        let user = ledger.grant_points("u1", 10).await.unwrap().unwrap();
        assert_eq!(user.points, 20);
    }

    #[tokio::test]
    async fn test_grant_points_missing_user_is_noop() {
        let (ledger, _) = ledger_with_user("u1").await;
        assert!(ledger.grant_points("ghost", 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_grant_badge_idempotent() {
        let (ledger, _) = ledger_with_user("u1").await;
        ledger.grant_badge("u1", Badge::Courage).await.unwrap();
        let user = ledger
            .grant_badge("u1", Badge::Courage)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.badges, vec![Badge::Courage]);
    }

    #[tokio::test]
    async fn test_award_records_celebration() {
        let (ledger, db) = ledger_with_user("u1").await;
        let user = ledger.award("u1", Award::TRIED_AGAIN).await.unwrap();
        assert_eq!(user.points, points::TRIED_AGAIN);

        let feed = db.recent_celebrations("u1", 20).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].kind, CelebrationKind::TriedAgain);
        assert_eq!(feed[0].points, points::TRIED_AGAIN);
    }

    #[tokio::test]
    async fn test_award_missing_user_is_not_found() {
        let (ledger, db) = ledger_with_user("u1").await;
        let err = ledger.award("ghost", Award::WEEKLY_CHECKIN).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(db.recent_celebrations("ghost", 20).await.unwrap().is_empty());
    }
}
