// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running and skip
//! themselves when FIRESTORE_EMULATOR_HOST is not set.

use std::sync::Arc;

use rebound::db::{new_id, FirestoreDb, Store};
use rebound::error::AppError;
use rebound::models::{Badge, ChatRoom, Match, Mood, NewPost, NewUser, User, WeeklyCheckin};

mod common;
use common::test_db;

/// Helper to create a basic test user with a unique name.
fn test_user(failures: &[&str]) -> User {
    let id = new_id();
    NewUser {
        username: None,
        category: Some("Job Search".to_string()),
        goal: "Land a PM role".to_string(),
        failures: failures.iter().map(|f| f.to_string()).collect(),
        failure_description: None,
        severity: Some(3),
        learning_style: None,
        availability: None,
        accountability_style: None,
        linkedin_url: None,
    }
    .into_user(
        id.clone(),
        format!("Test_User_{}", &id[..8]),
        chrono::Utc::now(),
    )
}

#[tokio::test]
async fn test_offline_store_reports_database_error() {
    let db = FirestoreDb::new_mock();
    let err = db.get_user("anyone").await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
}

#[tokio::test]
async fn test_user_roundtrip_and_increment() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user(&["Burnout"]);
    assert!(db.get_user(&user.id).await.unwrap().is_none());

    db.create_user(&user).await.unwrap();
    let fetched = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(fetched, user);

    db.increment_points(&user.id, 10).await.unwrap();
    let updated = db.increment_points(&user.id, 10).await.unwrap().unwrap();
    assert_eq!(updated.points, 20);

    let by_name = db.get_user_by_username(&user.username).await.unwrap();
    assert_eq!(by_name.map(|u| u.id), Some(user.id));
}

#[tokio::test]
async fn test_concurrent_badges_not_lost() {
    require_emulator!();

    let db = Arc::new(test_db().await);
    let user = test_user(&[]);
    db.create_user(&user).await.unwrap();

    let handles: Vec<_> = Badge::ALL
        .into_iter()
        .map(|badge| {
            let db = db.clone();
            let id = user.id.clone();
            tokio::spawn(async move { db.add_badge(&id, badge).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.badges.len(), Badge::ALL.len());
}

#[tokio::test]
async fn test_encouragement_once_per_user() {
    require_emulator!();

    let db = test_db().await;
    let author = test_user(&[]);
    db.create_user(&author).await.unwrap();
    let post = NewPost {
        user_id: author.id.clone(),
        category: None,
        content: "Missed the deadline".to_string(),
        severity: None,
    }
    .into_post(new_id(), author.username.clone(), chrono::Utc::now());
    db.create_post(&post).await.unwrap();

    let first = db.encourage_post(&post.id, "fan").await.unwrap().unwrap();
    assert!(first.changed);
    let second = db.encourage_post(&post.id, "fan").await.unwrap().unwrap();
    assert!(!second.changed);
    assert_eq!(second.record.encouragements, 1);
    assert_eq!(second.record.encouraged_by, vec!["fan"]);
}

#[tokio::test]
async fn test_match_and_room_written_together() {
    require_emulator!();

    let db = test_db().await;
    let a = test_user(&["Burnout"]);
    let b = test_user(&["Burnout"]);
    db.create_user(&a).await.unwrap();
    db.create_user(&b).await.unwrap();

    let now = chrono::Utc::now();
    let room = ChatRoom {
        id: new_id(),
        match_id: new_id(),
        room_name: "The Mighty Guild".to_string(),
        created_at: now,
    };
    let m = Match {
        id: room.match_id.clone(),
        user_ids: vec![a.id.clone(), b.id.clone()],
        category: "Burnout".to_string(),
        chat_room_id: room.id.clone(),
        is_active: true,
        profiles_revealed: vec![],
        created_at: now,
    };
    db.create_match_with_room(&room, &m).await.unwrap();

    let stored_room = db.get_room(&room.id).await.unwrap().unwrap();
    assert_eq!(stored_room.match_id, m.id);

    let for_b = db.matches_for_user(&b.id).await.unwrap();
    assert_eq!(for_b.len(), 1);
    assert_eq!(for_b[0].id, m.id);

    let revealed = db.add_reveal(&m.id, &a.id).await.unwrap().unwrap();
    assert_eq!(revealed.record.profiles_revealed, vec![a.id.clone()]);
}

#[tokio::test]
async fn test_checkins_returned_oldest_first() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user(&[]);
    db.create_user(&user).await.unwrap();

    // Ids are random, so document order says nothing about creation order.
    let start = chrono::Utc::now();
    for (i, mood) in [Mood::Tough, Mood::Okay, Mood::Great].into_iter().enumerate() {
        let checkin = WeeklyCheckin {
            id: new_id(),
            user_id: user.id.clone(),
            mood,
            accomplishment: None,
            need_support: None,
            created_at: start + chrono::Duration::seconds(i as i64),
        };
        db.create_checkin(&checkin).await.unwrap();
    }

    let moods: Vec<Mood> = db
        .checkins_for_user(&user.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.mood)
        .collect();
    assert_eq!(moods, vec![Mood::Tough, Mood::Okay, Mood::Great]);
}

#[tokio::test]
async fn test_concurrent_registration_claims_username_once() {
    require_emulator!();

    let db = Arc::new(test_db().await);
    let username = format!("Claimed_Name_{}", &new_id()[..8]);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let db = db.clone();
            let mut user = test_user(&[]);
            user.username = username.clone();
            tokio::spawn(async move { db.create_user(&user).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => created += 1,
            Err(e) => assert!(matches!(e, AppError::BadRequest(_)), "unexpected error: {e:?}"),
        }
    }
    assert_eq!(created, 1);
    assert!(db.get_user_by_username(&username).await.unwrap().is_some());
}
