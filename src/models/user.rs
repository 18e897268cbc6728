//! User model for storage and API.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

use crate::models::Badge;

/// Category assigned when onboarding does not pick one.
pub const DEFAULT_CATEGORY: &str = "General";

const USERNAME_ADJECTIVES: &[&str] = &[
    "Phoenix", "Rising", "Brave", "Bold", "Determined", "Fearless", "Mighty", "Resilient",
    "Steady", "Luminous", "Bright", "Calm", "Noble", "Gentle", "Fierce",
];

const USERNAME_NOUNS: &[&str] = &[
    "Eagle", "Tiger", "Mountain", "Star", "Warrior", "Champion", "Explorer", "Pioneer", "Voyager",
    "Falcon", "Wolf", "River", "Summit", "Compass", "Anchor",
];

/// Pseudonymous user stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// Opaque id held by the client (also used as document ID)
    pub id: String,
    /// Generated display name, unique across users
    pub username: String,
    /// Onboarding category (e.g. "Job Search")
    pub category: String,
    pub goal: String,
    /// Self-reported failure tags, in the order the user picked them
    #[serde(default)]
    pub failures: Vec<String>,
    pub failure_description: Option<String>,
    /// 1 (minor) to 5 (devastating)
    pub severity: Option<u8>,
    /// Running point total; only ever increased
    #[serde(default)]
    pub points: u32,
    /// Earned badges, no duplicates
    #[serde(default)]
    pub badges: Vec<Badge>,
    pub learning_style: Option<String>,
    pub availability: Option<String>,
    pub accountability_style: Option<String>,
    /// External profile link, disclosed only after a mutual reveal
    pub linkedin_url: Option<String>,
    #[serde(with = "crate::time_utils::fixed_rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub last_active: DateTime<Utc>,
    #[serde(with = "crate::time_utils::fixed_rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_badge(&self, badge: Badge) -> bool {
        self.badges.contains(&badge)
    }
}

/// Onboarding payload for `POST /api/users`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Client-chosen username; generated when absent
    #[validate(length(min = 3, max = 40))]
    pub username: Option<String>,
    #[validate(length(min = 1, max = 80))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub goal: String,
    #[serde(default)]
    #[validate(length(max = 20), custom(function = "validate_tags"))]
    pub failures: Vec<String>,
    #[validate(length(max = 2000))]
    pub failure_description: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub severity: Option<u8>,
    #[validate(length(max = 100))]
    pub learning_style: Option<String>,
    #[validate(length(max = 100))]
    pub availability: Option<String>,
    #[validate(length(max = 100))]
    pub accountability_style: Option<String>,
    #[validate(url)]
    pub linkedin_url: Option<String>,
}

impl NewUser {
    /// Build the stored user with server-assigned fields.
    pub fn into_user(self, id: String, username: String, now: DateTime<Utc>) -> User {
        User {
            id,
            username,
            category: self
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            goal: self.goal,
            failures: self.failures.into_iter().map(|f| f.trim().to_string()).collect(),
            failure_description: self.failure_description,
            severity: self.severity,
            points: 0,
            badges: Vec::new(),
            learning_style: self.learning_style,
            availability: self.availability,
            accountability_style: self.accountability_style,
            linkedin_url: self.linkedin_url,
            last_active: now,
            created_at: now,
        }
    }
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    for tag in tags {
        let len = tag.trim().chars().count();
        if len == 0 || len > 80 {
            let mut err = ValidationError::new("failure_tag");
            err.message = Some("each failure must be 1-80 characters".into());
            return Err(err);
        }
    }
    Ok(())
}

/// Generate a display name like `Brave_Falcon_4821`.
pub fn generate_username<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = USERNAME_ADJECTIVES.choose(rng).copied().unwrap_or("Brave");
    let noun = USERNAME_NOUNS.choose(rng).copied().unwrap_or("Explorer");
    let number: u16 = rng.gen_range(1000..10000);
    format!("{}_{}_{}", adjective, noun, number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> NewUser {
        NewUser {
            username: None,
            category: None,
            goal: "Land a product manager role".to_string(),
            failures: vec!["Failed interview".to_string(), "Burnout".to_string()],
            failure_description: None,
            severity: Some(3),
            learning_style: None,
            availability: None,
            accountability_style: None,
            linkedin_url: None,
        }
    }

    #[test]
    fn test_generated_username_shape() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let name = generate_username(&mut rng);
            let parts: Vec<&str> = name.split('_').collect();
            assert_eq!(parts.len(), 3, "unexpected username {}", name);
            assert!(USERNAME_ADJECTIVES.contains(&parts[0]));
            assert!(USERNAME_NOUNS.contains(&parts[1]));
            let number: u16 = parts[2].parse().unwrap();
            assert!((1000..10000).contains(&number));
        }
    }

    #[test]
    fn test_valid_payload_passes() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn test_empty_goal_rejected() {
        let mut p = payload();
        p.goal = String::new();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_blank_failure_tag_rejected() {
        let mut p = payload();
        p.failures.push("   ".to_string());
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_severity_out_of_range_rejected() {
        let mut p = payload();
        p.severity = Some(9);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_into_user_defaults() {
        let now = Utc::now();
        let user = payload().into_user("u1".to_string(), "Calm_Wolf_1234".to_string(), now);
        assert_eq!(user.category, DEFAULT_CATEGORY);
        assert_eq!(user.points, 0);
        assert!(user.badges.is_empty());
        assert_eq!(user.created_at, now);
    }
}
