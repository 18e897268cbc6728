// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Rebound: peer support for people bouncing back from setbacks
//!
//! This crate provides the backend API: a feed of shared failures,
//! matchmaking into accountability rooms, room challenges, a points and
//! badges ledger, and a realtime relay for chat notifications.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use db::Store;
use services::{ContentService, Ledger, Matchmaker, RevealService, RoomRegistry};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub content: ContentService,
    pub ledger: Ledger,
    pub matchmaker: Matchmaker,
    pub reveal: RevealService,
    pub relay: Arc<RoomRegistry>,
}

impl AppState {
    /// Wire the services around a store and a content service.
    pub fn new(config: Config, db: Arc<dyn Store>, content: ContentService) -> Self {
        let ledger = Ledger::new(db.clone());
        let matchmaker = Matchmaker::new(
            db.clone(),
            content.clone(),
            ledger.clone(),
            config.match_policy,
        );
        let reveal = RevealService::new(db.clone());
        Self {
            config,
            db,
            content,
            ledger,
            matchmaker,
            reveal,
            relay: Arc::new(RoomRegistry::new()),
        }
    }
}
