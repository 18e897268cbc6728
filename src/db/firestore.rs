// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing the entity store.
//!
//! Document IDs are the entity ids. Collections:
//! - `users`, `posts`, `matches`, `chat_rooms`, `messages`
//! - `challenges`, `celebrations`, `weekly_checkins`
//! - `usernames`: claim markers keyed by a UUIDv5 of the username
//!
//! Read-modify-write updates (points, badges, encouragements, reveal
//! opt-ins, challenge completions) are serialized per document with an
//! in-process lock, then written back. A match and its room are committed
//! together in one transaction.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::{collections, Mutation, Store};
use crate::error::AppError;
use crate::models::{
    Badge, Celebration, Challenge, ChatRoom, Match, Message, Post, User, WeeklyCheckin,
};

/// Per-document locks for read-modify-write updates, keyed by `collection/id`.
type RowLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Marker document that reserves a username for one user.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsernameClaim {
    username: String,
    user_id: String,
}

/// Document id for a username claim. Usernames may hold characters that
/// are not valid in a document id, so the id is derived instead.
fn username_claim_id(username: &str) -> String {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, username.as_bytes()).to_string()
}

fn username_taken(username: &str) -> AppError {
    AppError::BadRequest(format!("Username {} is already taken", username))
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    row_locks: RowLocks,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self::with_client(Some(client)))
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self::with_client(Some(client)))
    }

    /// Create a disconnected client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self::with_client(None)
    }

    fn with_client(client: Option<firestore::FirestoreDb>) -> Self {
        Self {
            client,
            row_locks: Arc::new(DashMap::new()),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Generic Document Helpers ────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Create the claim marker for `username`. Firestore rejects the insert
    /// if the document exists, so two registrations cannot both claim it.
    async fn claim_username(&self, username: &str, user_id: &str) -> Result<(), AppError> {
        let claim = UsernameClaim {
            username: username.to_string(),
            user_id: user_id.to_string(),
        };
        let inserted: Result<UsernameClaim, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERNAMES)
            .document_id(username_claim_id(username))
            .object(&claim)
            .execute()
            .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => {
                Err(username_taken(username))
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn release_username(&self, username: &str) {
        let released = match self.get_client() {
            Ok(client) => client
                .fluent()
                .delete()
                .from(collections::USERNAMES)
                .document_id(username_claim_id(username))
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Err(e) => Err(e),
        };
        if let Err(e) = released {
            tracing::warn!(username, error = %e, "Failed to release username claim");
        }
    }

    /// Read a document, apply `mutate`, and write it back if it reports a change.
    ///
    /// Holds the document's row lock for the whole read-modify-write, so two
    /// concurrent updates of the same document cannot overwrite each other.
    async fn modify_doc<T, F>(
        &self,
        collection: &str,
        id: &str,
        mutate: F,
    ) -> Result<Option<Mutation<T>>, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce(&mut T) -> bool + Send,
    {
        let key = format!("{}/{}", collection, id);
        let lock = self
            .row_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock().await;
            self.read_modify_write(collection, id, mutate).await
        };

        // Drop the entry unless another task still holds a handle to it.
        self.row_locks.remove_if(&key, |_, l| Arc::strong_count(l) == 2);
        result
    }

    async fn read_modify_write<T, F>(
        &self,
        collection: &str,
        id: &str,
        mutate: F,
    ) -> Result<Option<Mutation<T>>, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce(&mut T) -> bool + Send,
    {
        let Some(mut record) = self.get_doc::<T>(collection, id).await? else {
            return Ok(None);
        };

        if !mutate(&mut record) {
            return Ok(Some(Mutation::unchanged(record)));
        }

        self.set_doc(collection, id, &record).await?;
        Ok(Some(Mutation::changed(record)))
    }
}

/// Append `value` to `list` unless present.
fn append_if_absent<V: PartialEq>(list: &mut Vec<V>, value: V) -> bool {
    if list.contains(&value) {
        false
    } else {
        list.push(value);
        true
    }
}

#[async_trait::async_trait]
impl Store for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        // Users written before claim markers existed have no marker.
        if self.get_user_by_username(&user.username).await?.is_some() {
            return Err(username_taken(&user.username));
        }
        self.claim_username(&user.username, &user.id).await?;

        if let Err(e) = self.set_doc(collections::USERS, &user.id, user).await {
            self.release_username(&user.username).await;
            return Err(e);
        }
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let username = username.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("username").eq(username.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn increment_points(&self, id: &str, delta: u32) -> Result<Option<User>, AppError> {
        let updated = self
            .modify_doc(collections::USERS, id, |user: &mut User| {
                user.points = user.points.saturating_add(delta);
                true
            })
            .await?;
        Ok(updated.map(|m| m.record))
    }

    async fn add_badge(&self, id: &str, badge: Badge) -> Result<Option<Mutation<User>>, AppError> {
        self.modify_doc(collections::USERS, id, |user: &mut User| {
            append_if_absent(&mut user.badges, badge)
        })
        .await
    }

    async fn touch_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let now = chrono::Utc::now();
        let updated = self
            .modify_doc(collections::USERS, id, |user: &mut User| {
                user.last_active = now;
                true
            })
            .await?;
        Ok(updated.map(|m| m.record))
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("points", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit as u32)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Post Operations ─────────────────────────────────────────

    async fn create_post(&self, post: &Post) -> Result<(), AppError> {
        self.set_doc(collections::POSTS, &post.id, post).await
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        self.get_doc(collections::POSTS, id).await
    }

    async fn recent_posts(&self, limit: usize) -> Result<Vec<Post>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::POSTS)
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit as u32)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn encourage_post(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> Result<Option<Mutation<Post>>, AppError> {
        let user_id = user_id.to_string();
        self.modify_doc(collections::POSTS, post_id, move |post: &mut Post| {
            let changed = append_if_absent(&mut post.encouraged_by, user_id);
            if changed {
                post.encouragements += 1;
            }
            changed
        })
        .await
    }

    // ─── Match & Room Operations ─────────────────────────────────

    async fn create_match_with_room(&self, room: &ChatRoom, m: &Match) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::CHAT_ROOMS)
            .document_id(&room.id)
            .object(room)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add room to transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::MATCHES)
            .document_id(&m.id)
            .object(m)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add match to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(match_id = %m.id, room_id = %room.id, "Match and room committed");
        Ok(())
    }

    async fn get_match(&self, id: &str) -> Result<Option<Match>, AppError> {
        self.get_doc(collections::MATCHES, id).await
    }

    async fn matches_for_user(&self, user_id: &str) -> Result<Vec<Match>, AppError> {
        let user_id = user_id.to_string();
        let mut matches: Vec<Match> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::MATCHES)
            .filter(move |q| {
                q.for_all([
                    q.field("isActive").eq(true),
                    q.field("userIds").array_contains(user_id.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Sorted here to avoid a composite index on (userIds, createdAt).
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }

    async fn add_reveal(
        &self,
        match_id: &str,
        user_id: &str,
    ) -> Result<Option<Mutation<Match>>, AppError> {
        let user_id = user_id.to_string();
        self.modify_doc(collections::MATCHES, match_id, move |m: &mut Match| {
            append_if_absent(&mut m.profiles_revealed, user_id)
        })
        .await
    }

    async fn get_room(&self, id: &str) -> Result<Option<ChatRoom>, AppError> {
        self.get_doc(collections::CHAT_ROOMS, id).await
    }

    // ─── Message Operations ──────────────────────────────────────

    async fn create_message(&self, message: &Message) -> Result<(), AppError> {
        self.set_doc(collections::MESSAGES, &message.id, message)
            .await
    }

    async fn messages_for_room(&self, room_id: &str) -> Result<Vec<Message>, AppError> {
        let room_id = room_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MESSAGES)
            .filter(move |q| q.for_all([q.field("chatRoomId").eq(room_id.clone())]))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Challenge Operations ────────────────────────────────────

    async fn create_challenge(&self, challenge: &Challenge) -> Result<(), AppError> {
        self.set_doc(collections::CHALLENGES, &challenge.id, challenge)
            .await
    }

    async fn get_challenge(&self, id: &str) -> Result<Option<Challenge>, AppError> {
        self.get_doc(collections::CHALLENGES, id).await
    }

    async fn latest_challenge(&self, room_id: &str) -> Result<Option<Challenge>, AppError> {
        let room_id = room_id.to_string();
        let challenges: Vec<Challenge> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CHALLENGES)
            .filter(move |q| q.for_all([q.field("chatRoomId").eq(room_id.clone())]))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(challenges.into_iter().next())
    }

    async fn complete_challenge(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Mutation<Challenge>>, AppError> {
        let user_id = user_id.to_string();
        self.modify_doc(collections::CHALLENGES, id, move |c: &mut Challenge| {
            append_if_absent(&mut c.completed_by, user_id)
        })
        .await
    }

    // ─── Celebration & Check-in Operations ───────────────────────

    async fn create_celebration(&self, celebration: &Celebration) -> Result<(), AppError> {
        self.set_doc(collections::CELEBRATIONS, &celebration.id, celebration)
            .await
    }

    async fn recent_celebrations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Celebration>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CELEBRATIONS)
            .filter(move |q| q.for_all([q.field("userId").eq(user_id.clone())]))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit as u32)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_checkin(&self, checkin: &WeeklyCheckin) -> Result<(), AppError> {
        self.set_doc(collections::WEEKLY_CHECKINS, &checkin.id, checkin)
            .await
    }

    async fn checkins_for_user(&self, user_id: &str) -> Result<Vec<WeeklyCheckin>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WEEKLY_CHECKINS)
            .filter(move |q| q.for_all([q.field("userId").eq(user_id.clone())]))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_row_locks_released_after_update() {
        let db = FirestoreDb::new_mock();

        // Offline reads fail, but the lock is still taken and must be dropped.
        let err = db.add_badge("u1", Badge::Courage).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert!(db.encourage_post("p1", "u1").await.is_err());
        assert!(db.row_locks.is_empty());
    }

    #[tokio::test]
    async fn test_row_lock_kept_while_contended() {
        let db = FirestoreDb::new_mock();
        let held = db
            .row_locks
            .entry("users/u1".to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        assert!(db.increment_points("u1", 5).await.is_err());
        assert!(db.row_locks.contains_key("users/u1"));

        drop(held);
        assert!(db.touch_user("u1").await.is_err());
        assert!(db.row_locks.is_empty());
    }

    #[test]
    fn test_username_claim_id_is_stable_and_safe() {
        let id = username_claim_id("a/b");
        assert_eq!(id, username_claim_id("a/b"));
        assert_ne!(id, username_claim_id("a/c"));
        assert!(!id.contains('/'));
    }
}
