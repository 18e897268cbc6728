// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod content;
pub mod ledger;
pub mod matchmaking;
pub mod relay;
pub mod reveal;
pub mod seed;

pub use content::{ChatCompletionsClient, ContentError, ContentService, TextGenerator};
pub use ledger::{Award, Ledger};
pub use matchmaking::{MatchView, Matchmaker};
pub use relay::RoomRegistry;
pub use reveal::{RevealService, RoomDetail};
