// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Matchmaking engine.
//!
//! Handles the find-match workflow:
//! 1. Load the requester and everyone they are already matched with
//! 2. Pick a partner from the remaining users (tag overlap or category)
//! 3. Write the chat room and match together
//! 4. Issue a joint challenge to the new room
//! 5. Grant the requester the connector badge

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::config::MatchPolicy;
use crate::db::{new_id, Store};
use crate::error::{AppError, Result};
use crate::models::chat::DEFAULT_CHALLENGE_MINUTES;
use crate::models::matching::DEFAULT_MATCH_CATEGORY;
use crate::models::{Badge, Challenge, ChatRoom, Match, User};
use crate::services::{ContentService, Ledger};

const ROOM_NAME_ADJECTIVES: &[&str] = &[
    "Comeback",
    "Rising",
    "Unstoppable",
    "Resilient",
    "Brave",
    "Bold",
    "Mighty",
    "Fierce",
    "Luminous",
    "Phoenix",
];

const ROOM_NAME_NOUNS: &[&str] = &[
    "Crew", "Squad", "Alliance", "Circle", "Guild", "Team", "Tribe", "Pack", "Force", "League",
];

/// A match together with its room and, when just created, its challenge.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    #[serde(flatten)]
    pub details: Match,
    pub room: Option<ChatRoom>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<Challenge>,
}

/// Number of failure tags the two lists share, counting repeats.
///
/// Multiset intersection: a tag listed twice by both users counts twice.
/// Tags compare by exact, case-sensitive equality.
pub fn overlap_score(a: &[String], b: &[String]) -> usize {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tag in b {
        *counts.entry(tag.as_str()).or_default() += 1;
    }
    a.iter()
        .filter(|tag| match counts.get_mut(tag.as_str()) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        })
        .count()
}

/// The requester plus every co-member of the requester's active matches.
pub fn exclusion_set(requester_id: &str, matches: &[Match]) -> HashSet<String> {
    let mut excluded: HashSet<String> = matches
        .iter()
        .flat_map(|m| m.user_ids.iter().cloned())
        .collect();
    excluded.insert(requester_id.to_string());
    excluded
}

/// Highest-overlap candidate; the earliest one wins ties.
pub fn select_by_overlap<'a>(requester: &User, candidates: &'a [User]) -> Option<&'a User> {
    let mut best: Option<(&User, usize)> = None;
    for candidate in candidates {
        let score = overlap_score(&requester.failures, &candidate.failures);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(user, _)| user)
}

/// Uniform random pick among candidates sharing the requester's category.
pub fn select_by_category<'a, R: Rng + ?Sized>(
    requester: &User,
    candidates: &'a [User],
    rng: &mut R,
) -> Option<&'a User> {
    let same_category: Vec<&User> = candidates
        .iter()
        .filter(|c| c.category == requester.category)
        .collect();
    same_category.choose(rng).copied()
}

/// First of the requester's tags that the partner also has, else the default.
pub fn shared_category(requester: &User, partner: &User) -> String {
    requester
        .failures
        .iter()
        .find(|tag| partner.failures.contains(tag))
        .cloned()
        .unwrap_or_else(|| DEFAULT_MATCH_CATEGORY.to_string())
}

/// Room name like "The Resilient Guild".
pub fn generate_room_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ROOM_NAME_ADJECTIVES.choose(rng).copied().unwrap_or("Comeback");
    let noun = ROOM_NAME_NOUNS.choose(rng).copied().unwrap_or("Crew");
    format!("The {} {}", adjective, noun)
}

/// Pairs users into accountability rooms.
#[derive(Clone)]
pub struct Matchmaker {
    db: Arc<dyn Store>,
    content: ContentService,
    ledger: Ledger,
    policy: MatchPolicy,
}

impl Matchmaker {
    pub fn new(
        db: Arc<dyn Store>,
        content: ContentService,
        ledger: Ledger,
        policy: MatchPolicy,
    ) -> Self {
        Self {
            db,
            content,
            ledger,
            policy,
        }
    }

    /// Find a partner for `user_id` and open a room for the pair.
    ///
    /// Fails with `NotFound` if the requester does not exist and
    /// `NoCandidates` if nobody eligible is left. Nothing is written in
    /// either case.
    pub async fn find_match(&self, user_id: &str) -> Result<MatchView> {
        let requester = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let existing = self.db.matches_for_user(user_id).await?;
        let excluded = exclusion_set(user_id, &existing);

        let candidates: Vec<User> = self
            .db
            .list_users()
            .await?
            .into_iter()
            .filter(|u| !excluded.contains(&u.id))
            .collect();

        let (partner, category) = match self.policy {
            MatchPolicy::TagOverlap => {
                let partner = select_by_overlap(&requester, &candidates)
                    .ok_or(AppError::NoCandidates)?
                    .clone();
                let category = shared_category(&requester, &partner);
                (partner, category)
            }
            MatchPolicy::Category => {
                let partner =
                    select_by_category(&requester, &candidates, &mut rand::thread_rng())
                        .ok_or(AppError::NoCandidates)?
                        .clone();
                (partner, requester.category.clone())
            }
        };

        tracing::debug!(
            user_id,
            partner_id = %partner.id,
            candidates = candidates.len(),
            excluded = excluded.len(),
            %category,
            "Selected match partner"
        );

        // Both ids exist before either document is written.
        let now = chrono::Utc::now();
        let room = ChatRoom {
            id: new_id(),
            match_id: new_id(),
            room_name: generate_room_name(&mut rand::thread_rng()),
            created_at: now,
        };
        let new_match = Match {
            id: room.match_id.clone(),
            user_ids: vec![requester.id.clone(), partner.id.clone()],
            category,
            chat_room_id: room.id.clone(),
            is_active: true,
            profiles_revealed: Vec::new(),
            created_at: now,
        };

        self.db.create_match_with_room(&room, &new_match).await?;

        tracing::info!(
            match_id = %new_match.id,
            room_id = %room.id,
            user_id,
            partner_id = %partner.id,
            "Match created"
        );

        let challenge = self.issue_challenge(&room, &requester, &partner).await;

        if let Err(e) = self.ledger.grant_badge(user_id, Badge::Connector).await {
            tracing::warn!(user_id, error = %e, "Failed to grant connector badge");
        }

        Ok(MatchView {
            details: new_match,
            room: Some(room),
            challenge,
        })
    }

    /// Generate and store the room's first challenge.
    ///
    /// The match already exists at this point, so a failed write is logged
    /// and the match is still returned.
    async fn issue_challenge(
        &self,
        room: &ChatRoom,
        requester: &User,
        partner: &User,
    ) -> Option<Challenge> {
        let failures: Vec<String> = requester
            .failures
            .iter()
            .chain(partner.failures.iter())
            .cloned()
            .collect();
        let text = self
            .content
            .challenge(&failures, Some(requester.goal.as_str()))
            .await;

        let challenge = Challenge {
            id: new_id(),
            chat_room_id: room.id.clone(),
            challenge: text,
            estimated_time: DEFAULT_CHALLENGE_MINUTES,
            completed_by: Vec::new(),
            created_at: chrono::Utc::now(),
        };

        match self.db.create_challenge(&challenge).await {
            Ok(()) => Some(challenge),
            Err(e) => {
                tracing::warn!(room_id = %room.id, error = %e, "Failed to store room challenge");
                None
            }
        }
    }

    /// Active matches for a user, each with its room.
    pub async fn matches_with_rooms(&self, user_id: &str) -> Result<Vec<MatchView>> {
        let matches = self.db.matches_for_user(user_id).await?;
        let mut views = Vec::with_capacity(matches.len());
        for m in matches {
            let room = self.db.get_room(&m.chat_room_id).await?;
            views.push(MatchView {
                details: m,
                room,
                challenge: None,
            });
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn user(id: &str, category: &str, failures: &[&str]) -> User {
        let now = chrono::Utc::now();
        User {
            id: id.to_string(),
            username: format!("User_{}", id),
            category: category.to_string(),
            goal: "Keep going".to_string(),
            failures: tags(failures),
            failure_description: None,
            severity: None,
            points: 0,
            badges: vec![],
            learning_style: None,
            availability: None,
            accountability_style: None,
            linkedin_url: None,
            last_active: now,
            created_at: now,
        }
    }

    #[test]
    fn test_overlap_is_multiset_intersection() {
        assert_eq!(overlap_score(&tags(&["a", "b"]), &tags(&["b", "c"])), 1);
        assert_eq!(overlap_score(&tags(&["a", "a"]), &tags(&["a", "a", "a"])), 2);
        assert_eq!(overlap_score(&tags(&["a", "a"]), &tags(&["a"])), 1);
        assert_eq!(overlap_score(&tags(&["Burnout"]), &tags(&["burnout"])), 0);
        assert_eq!(overlap_score(&[], &tags(&["a"])), 0);
    }

    #[test]
    fn test_exclusion_includes_self_and_co_members() {
        let now = chrono::Utc::now();
        let m = Match {
            id: "m".to_string(),
            user_ids: tags(&["me", "x"]),
            category: "General".to_string(),
            chat_room_id: "r".to_string(),
            is_active: true,
            profiles_revealed: vec![],
            created_at: now,
        };
        let excluded = exclusion_set("me", &[m]);
        assert_eq!(excluded.len(), 2);
        assert!(excluded.contains("me"));
        assert!(excluded.contains("x"));
        assert_eq!(exclusion_set("me", &[]).len(), 1);
    }

    #[test]
    fn test_select_by_overlap_prefers_highest_score() {
        let me = user("me", "Job Search", &["Burnout", "Failed interview"]);
        let pool = vec![
            user("a", "Job Search", &["Diet failed"]),
            user("b", "Job Search", &["Burnout", "Failed interview"]),
            user("c", "Job Search", &["Burnout"]),
        ];
        assert_eq!(select_by_overlap(&me, &pool).unwrap().id, "b");
    }

    #[test]
    fn test_select_by_overlap_ties_go_to_first() {
        let me = user("me", "Job Search", &["Burnout"]);
        let pool = vec![
            user("a", "Job Search", &["Burnout"]),
            user("b", "Job Search", &["Burnout"]),
        ];
        assert_eq!(select_by_overlap(&me, &pool).unwrap().id, "a");

        // With no overlap at all the first candidate still wins.
        let me = user("me", "Job Search", &["Nothing shared"]);
        assert_eq!(select_by_overlap(&me, &pool).unwrap().id, "a");
        assert!(select_by_overlap(&me, &[]).is_none());
    }

    #[test]
    fn test_select_by_category_only_same_category() {
        let me = user("me", "Health & Fitness", &[]);
        let pool = vec![
            user("a", "Job Search", &[]),
            user("b", "Health & Fitness", &[]),
        ];
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            assert_eq!(select_by_category(&me, &pool, &mut rng).unwrap().id, "b");
        }
        assert!(select_by_category(&me, &pool[..1], &mut rng).is_none());
    }

    #[test]
    fn test_shared_category() {
        let me = user("me", "x", &["Failed interview", "Burnout"]);
        let partner = user("p", "x", &["Burnout", "Failed interview"]);
        assert_eq!(shared_category(&me, &partner), "Failed interview");

        let stranger = user("s", "x", &["Diet failed"]);
        assert_eq!(shared_category(&me, &stranger), DEFAULT_MATCH_CATEGORY);
    }

    #[test]
    fn test_room_name_format() {
        let mut rng = rand::thread_rng();
        let name = generate_room_name(&mut rng);
        let words: Vec<&str> = name.split(' ').collect();
        assert_eq!(words.len(), 3);
        assert_eq!(words[0], "The");
        assert!(ROOM_NAME_ADJECTIVES.contains(&words[1]));
        assert!(ROOM_NAME_NOUNS.contains(&words[2]));
    }
}
