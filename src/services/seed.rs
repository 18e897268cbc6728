// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Demo data for local development.

use crate::db::{new_id, Store};
use crate::error::Result;
use crate::models::{Badge, NewPost, NewUser};
use crate::services::accounts;

struct DemoUser {
    category: &'static str,
    goal: &'static str,
    failures: &'static [&'static str],
    description: &'static str,
    severity: u8,
    points: u32,
    badges: &'static [Badge],
    post: &'static str,
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        category: "Job Search",
        goal: "Land a product manager role at a top tech company",
        failures: &[
            "Failed multiple interviews",
            "Rejected after final round",
            "Ghosted by recruiters",
        ],
        description: "I've been applying for PM roles for 6 months. Got to the final round 3 times but haven't landed an offer yet.",
        severity: 4,
        points: 245,
        badges: &[Badge::Courage, Badge::Supporter, Badge::Phoenix],
        post: "Just got rejected after a 5-round interview process. They said I was 'too junior' for the role. I have 4 years of experience. Feeling defeated but I know I need to keep going.",
    },
    DemoUser {
        category: "Starting a Business",
        goal: "Launch a SaaS product for small businesses",
        failures: &["Failed product launch", "Product didn't find market fit"],
        description: "Built a tool nobody wanted. Going back to customer discovery.",
        severity: 5,
        points: 180,
        badges: &[Badge::Courage, Badge::ActionTaker],
        post: "Spent 8 months building a product nobody wanted. Had to shut it down today. The hardest part isn't the failure, it's telling your team.",
    },
    DemoUser {
        category: "Learning a Skill",
        goal: "Become proficient in machine learning",
        failures: &["Gave up halfway through course", "Tutorial hell - no real projects"],
        description: "Watched 100 hours of tutorials but haven't built anything real.",
        severity: 3,
        points: 130,
        badges: &[Badge::Courage],
        post: "I've been in tutorial hell for 6 months. I can follow along but freeze when I try to build something from scratch. Anyone else feel this way?",
    },
    DemoUser {
        category: "Job Search",
        goal: "Transition from backend to full-stack engineering",
        failures: &["No responses to applications", "Failed multiple interviews"],
        description: "Switching from backend-only to full-stack. Struggling with frontend skills in interviews.",
        severity: 3,
        points: 95,
        badges: &[Badge::Courage, Badge::Supporter],
        post: "Applied to 47 jobs this month. Got 2 responses. Neither turned into interviews. Starting to wonder if my resume goes straight to the trash.",
    },
    DemoUser {
        category: "Health & Fitness",
        goal: "Run a half marathon by end of year",
        failures: &["Quit workout routine", "Injury setback"],
        description: "Knee injury set me back 2 months. Trying to get back into training.",
        severity: 4,
        points: 75,
        badges: &[Badge::Courage, Badge::Phoenix],
        post: "Tore my ACL during training. Doctor says 6-8 weeks off. My half marathon goal feels impossible now. But I'm not giving up, just recalibrating.",
    },
];

/// Seed demo users and posts if the store has no users.
///
/// Returns whether anything was written.
pub async fn seed_demo_data(db: &dyn Store) -> Result<bool> {
    if !db.list_users().await?.is_empty() {
        tracing::debug!("Store already has users, skipping demo seed");
        return Ok(false);
    }

    for demo in DEMO_USERS {
        let user = accounts::register(
            db,
            NewUser {
                username: None,
                category: Some(demo.category.to_string()),
                goal: demo.goal.to_string(),
                failures: demo.failures.iter().map(|f| f.to_string()).collect(),
                failure_description: Some(demo.description.to_string()),
                severity: Some(demo.severity),
                learning_style: None,
                availability: None,
                accountability_style: None,
                linkedin_url: None,
            },
        )
        .await?;

        db.increment_points(&user.id, demo.points).await?;
        for badge in demo.badges {
            db.add_badge(&user.id, *badge).await?;
        }

        let post = NewPost {
            user_id: user.id.clone(),
            category: Some(demo.category.to_string()),
            content: demo.post.to_string(),
            severity: Some(demo.severity),
        }
        .into_post(new_id(), user.username.clone(), chrono::Utc::now());
        db.create_post(&post).await?;
    }

    tracing::info!(users = DEMO_USERS.len(), "Seeded demo data");
    Ok(true)
}
