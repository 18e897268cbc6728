// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod badge;
pub mod celebration;
pub mod chat;
pub mod matching;
pub mod post;
pub mod user;

pub use badge::Badge;
pub use celebration::{Celebration, CelebrationKind, Mood, NewCheckin, WeeklyCheckin};
pub use chat::{Challenge, Message, NewMessage};
pub use matching::{ChatRoom, Match, RevealState};
pub use post::{NewPost, Post};
pub use user::{NewUser, User};
