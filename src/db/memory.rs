// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory entity store for local development and tests.
//!
//! All collections live behind one lock. Every mutation runs under a single
//! write guard, which makes increments and append-if-absent updates atomic
//! with respect to concurrent requests. Collections keep insertion order.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::db::{Mutation, Store};
use crate::error::AppError;
use crate::models::{
    Badge, Celebration, Challenge, ChatRoom, Match, Message, Post, User, WeeklyCheckin,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    matches: Vec<Match>,
    rooms: Vec<ChatRoom>,
    messages: Vec<Message>,
    challenges: Vec<Challenge>,
    celebrations: Vec<Celebration>,
    checkins: Vec<WeeklyCheckin>,
}

/// Process-local store. Data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::Database("Memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::Database("Memory store lock poisoned".to_string()))
    }
}

/// Insert a record, rejecting a duplicate id.
fn insert_unique<T: Clone>(
    rows: &mut Vec<T>,
    row: &T,
    id_of: impl Fn(&T) -> &str,
    collection: &str,
) -> Result<(), AppError> {
    let id = id_of(row);
    if rows.iter().any(|existing| id_of(existing) == id) {
        return Err(AppError::Database(format!(
            "Document {} already exists in {}",
            id, collection
        )));
    }
    rows.push(row.clone());
    Ok(())
}

/// Append `value` to `list` unless present. Returns whether it was appended.
fn append_if_absent<V: PartialEq>(list: &mut Vec<V>, value: V) -> bool {
    if list.contains(&value) {
        false
    } else {
        list.push(value);
        true
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let mut tables = self.write()?;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::BadRequest(format!(
                "Username {} is already taken",
                user.username
            )));
        }
        insert_unique(&mut tables.users, user, |u| &u.id, "users")
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.read()?.users.clone())
    }

    async fn increment_points(&self, id: &str, delta: u32) -> Result<Option<User>, AppError> {
        let mut tables = self.write()?;
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.points = user.points.saturating_add(delta);
            user.clone()
        }))
    }

    async fn add_badge(&self, id: &str, badge: Badge) -> Result<Option<Mutation<User>>, AppError> {
        let mut tables = self.write()?;
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            let changed = append_if_absent(&mut user.badges, badge);
            Mutation {
                record: user.clone(),
                changed,
            }
        }))
    }

    async fn touch_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let mut tables = self.write()?;
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.last_active = chrono::Utc::now();
            user.clone()
        }))
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<User>, AppError> {
        let mut users = self.read()?.users.clone();
        // Stable sort keeps creation order among equal totals.
        users.sort_by(|a, b| b.points.cmp(&a.points));
        users.truncate(limit);
        Ok(users)
    }

    async fn create_post(&self, post: &Post) -> Result<(), AppError> {
        insert_unique(&mut self.write()?.posts, post, |p| &p.id, "posts")
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        Ok(self.read()?.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn recent_posts(&self, limit: usize) -> Result<Vec<Post>, AppError> {
        Ok(self.read()?.posts.iter().rev().take(limit).cloned().collect())
    }

    async fn encourage_post(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> Result<Option<Mutation<Post>>, AppError> {
        let mut tables = self.write()?;
        Ok(tables.posts.iter_mut().find(|p| p.id == post_id).map(|post| {
            let changed = append_if_absent(&mut post.encouraged_by, user_id.to_string());
            if changed {
                post.encouragements += 1;
            }
            Mutation {
                record: post.clone(),
                changed,
            }
        }))
    }

    async fn create_match_with_room(&self, room: &ChatRoom, m: &Match) -> Result<(), AppError> {
        let mut tables = self.write()?;
        if tables.rooms.iter().any(|r| r.id == room.id)
            || tables.matches.iter().any(|existing| existing.id == m.id)
        {
            return Err(AppError::Database(format!(
                "Match {} or room {} already exists",
                m.id, room.id
            )));
        }
        tables.rooms.push(room.clone());
        tables.matches.push(m.clone());
        Ok(())
    }

    async fn get_match(&self, id: &str) -> Result<Option<Match>, AppError> {
        Ok(self.read()?.matches.iter().find(|m| m.id == id).cloned())
    }

    async fn matches_for_user(&self, user_id: &str) -> Result<Vec<Match>, AppError> {
        Ok(self
            .read()?
            .matches
            .iter()
            .rev()
            .filter(|m| m.is_active && m.is_member(user_id))
            .cloned()
            .collect())
    }

    async fn add_reveal(
        &self,
        match_id: &str,
        user_id: &str,
    ) -> Result<Option<Mutation<Match>>, AppError> {
        let mut tables = self.write()?;
        Ok(tables.matches.iter_mut().find(|m| m.id == match_id).map(|m| {
            let changed = append_if_absent(&mut m.profiles_revealed, user_id.to_string());
            Mutation {
                record: m.clone(),
                changed,
            }
        }))
    }

    async fn get_room(&self, id: &str) -> Result<Option<ChatRoom>, AppError> {
        Ok(self.read()?.rooms.iter().find(|r| r.id == id).cloned())
    }

    async fn create_message(&self, message: &Message) -> Result<(), AppError> {
        insert_unique(&mut self.write()?.messages, message, |m| &m.id, "messages")
    }

    async fn messages_for_room(&self, room_id: &str) -> Result<Vec<Message>, AppError> {
        Ok(self
            .read()?
            .messages
            .iter()
            .filter(|m| m.chat_room_id == room_id)
            .cloned()
            .collect())
    }

    async fn create_challenge(&self, challenge: &Challenge) -> Result<(), AppError> {
        insert_unique(
            &mut self.write()?.challenges,
            challenge,
            |c| &c.id,
            "challenges",
        )
    }

    async fn get_challenge(&self, id: &str) -> Result<Option<Challenge>, AppError> {
        Ok(self.read()?.challenges.iter().find(|c| c.id == id).cloned())
    }

    async fn latest_challenge(&self, room_id: &str) -> Result<Option<Challenge>, AppError> {
        Ok(self
            .read()?
            .challenges
            .iter()
            .rev()
            .find(|c| c.chat_room_id == room_id)
            .cloned())
    }

    async fn complete_challenge(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Mutation<Challenge>>, AppError> {
        let mut tables = self.write()?;
        Ok(tables.challenges.iter_mut().find(|c| c.id == id).map(|c| {
            let changed = append_if_absent(&mut c.completed_by, user_id.to_string());
            Mutation {
                record: c.clone(),
                changed,
            }
        }))
    }

    async fn create_celebration(&self, celebration: &Celebration) -> Result<(), AppError> {
        insert_unique(
            &mut self.write()?.celebrations,
            celebration,
            |c| &c.id,
            "celebrations",
        )
    }

    async fn recent_celebrations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Celebration>, AppError> {
        Ok(self
            .read()?
            .celebrations
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create_checkin(&self, checkin: &WeeklyCheckin) -> Result<(), AppError> {
        insert_unique(
            &mut self.write()?.checkins,
            checkin,
            |c| &c.id,
            "weekly_checkins",
        )
    }

    async fn checkins_for_user(&self, user_id: &str) -> Result<Vec<WeeklyCheckin>, AppError> {
        Ok(self
            .read()?
            .checkins
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }
}
