//! Entity store: the repository trait and its implementations.
//!
//! Handlers and services only see `Arc<dyn Store>`. Two backends exist:
//! Firestore for deployments and an in-memory store for local development
//! and tests.
//!
//! Every array-valued field (badges, encouragedBy, profilesRevealed,
//! completedBy) is only ever changed through an append-if-absent operation
//! that the backend performs atomically, and point totals only through an
//! add-delta increment.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{
    Badge, Celebration, Challenge, ChatRoom, Match, Message, Post, User, WeeklyCheckin,
};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const POSTS: &str = "posts";
    pub const MATCHES: &str = "matches";
    pub const CHAT_ROOMS: &str = "chat_rooms";
    pub const MESSAGES: &str = "messages";
    pub const CHALLENGES: &str = "challenges";
    pub const CELEBRATIONS: &str = "celebrations";
    pub const WEEKLY_CHECKINS: &str = "weekly_checkins";
    /// One marker document per claimed username
    pub const USERNAMES: &str = "usernames";
}

/// Outcome of an append-if-absent update.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation<T> {
    /// The record after the update
    pub record: T,
    /// False if the value was already present and nothing was written
    pub changed: bool,
}

impl<T> Mutation<T> {
    pub fn changed(record: T) -> Self {
        Self {
            record,
            changed: true,
        }
    }

    pub fn unchanged(record: T) -> Self {
        Self {
            record,
            changed: false,
        }
    }
}

/// Typed persistence for every entity.
///
/// Ids are generated by callers before writing. Lookups return `Ok(None)`
/// for missing documents; `Err` is reserved for backend failures.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn create_user(&self, user: &User) -> Result<(), AppError>;
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    /// All users in creation order (oldest first).
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    /// Atomically add `delta` to a user's points.
    async fn increment_points(&self, id: &str, delta: u32) -> Result<Option<User>, AppError>;
    /// Atomically add `badge` unless the user already has it.
    async fn add_badge(&self, id: &str, badge: Badge) -> Result<Option<Mutation<User>>, AppError>;
    /// Set the user's last-active time to now.
    async fn touch_user(&self, id: &str) -> Result<Option<User>, AppError>;
    /// Users by points, highest first.
    async fn leaderboard(&self, limit: usize) -> Result<Vec<User>, AppError>;

    // ─── Posts ───────────────────────────────────────────────────

    async fn create_post(&self, post: &Post) -> Result<(), AppError>;
    async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError>;
    /// Newest first.
    async fn recent_posts(&self, limit: usize) -> Result<Vec<Post>, AppError>;
    /// Atomically record one encouragement per user and bump the counter.
    async fn encourage_post(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> Result<Option<Mutation<Post>>, AppError>;

    // ─── Matches & Chat Rooms ────────────────────────────────────

    /// Write a match and its room together; neither is visible without the other.
    async fn create_match_with_room(&self, room: &ChatRoom, m: &Match) -> Result<(), AppError>;
    async fn get_match(&self, id: &str) -> Result<Option<Match>, AppError>;
    /// Active matches containing `user_id`, newest first.
    async fn matches_for_user(&self, user_id: &str) -> Result<Vec<Match>, AppError>;
    /// Atomically add `user_id` to the match's reveal opt-ins.
    async fn add_reveal(
        &self,
        match_id: &str,
        user_id: &str,
    ) -> Result<Option<Mutation<Match>>, AppError>;
    async fn get_room(&self, id: &str) -> Result<Option<ChatRoom>, AppError>;

    // ─── Messages ────────────────────────────────────────────────

    async fn create_message(&self, message: &Message) -> Result<(), AppError>;
    /// Oldest first.
    async fn messages_for_room(&self, room_id: &str) -> Result<Vec<Message>, AppError>;

    // ─── Challenges ──────────────────────────────────────────────

    async fn create_challenge(&self, challenge: &Challenge) -> Result<(), AppError>;
    async fn get_challenge(&self, id: &str) -> Result<Option<Challenge>, AppError>;
    /// Most recently issued challenge for a room.
    async fn latest_challenge(&self, room_id: &str) -> Result<Option<Challenge>, AppError>;
    /// Atomically add `user_id` to the challenge's completions.
    async fn complete_challenge(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Mutation<Challenge>>, AppError>;

    // ─── Celebrations & Check-ins ────────────────────────────────

    async fn create_celebration(&self, celebration: &Celebration) -> Result<(), AppError>;
    /// Newest first.
    async fn recent_celebrations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Celebration>, AppError>;
    async fn create_checkin(&self, checkin: &WeeklyCheckin) -> Result<(), AppError>;
    async fn checkins_for_user(&self, user_id: &str) -> Result<Vec<WeeklyCheckin>, AppError>;
}

/// Generate a new document id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
