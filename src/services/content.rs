// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Text-generation boundary for encouragement, challenge, and support copy.
//!
//! Every capability tries the remote generator first and falls back to local
//! content on any failure: unconfigured client, network error or timeout,
//! non-success status, or an unusable reply. Failures are logged here and
//! never reach the caller.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Errors from the text-generation service. Absorbed by `ContentService`.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("text generation is not configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}: {1}")]
    Status(u16, String),

    #[error("malformed reply: {0}")]
    Malformed(String),
}

/// One completion request.
#[derive(Debug, Clone)]
pub struct Prompt<'a> {
    pub system: &'a str,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Something that turns a prompt into text.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: Prompt<'_>) -> Result<String, ContentError>;
}

// ─── OpenAI-compatible Client ───────────────────────────────────

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(config: &Config) -> Result<Self, ContentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.content_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.content_api_url.trim_end_matches('/').to_string(),
            api_key: config.content_api_key.clone(),
            model: config.content_model.clone(),
        })
    }
}

#[async_trait::async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn complete(&self, prompt: Prompt<'_>) -> Result<String, ContentError> {
        let api_key = self.api_key.as_deref().ok_or(ContentError::NotConfigured)?;

        let body = CompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: prompt.max_tokens,
            temperature: prompt.temperature,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(ContentError::Status(status, text));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ContentError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ContentError::Malformed("empty completion".to_string()))
    }
}

// ─── Prompts ────────────────────────────────────────────────────

const ENCOURAGEMENT_SYSTEM: &str = "You are a warm, empathetic support companion in a community \
where people share their setbacks and failures. Generate a short, heartfelt encouragement \
message (2-3 sentences max) for someone who shared a setback. Be genuine, not generic. Don't use \
emojis. Focus on acknowledging their struggle and offering real perspective.";

const CHALLENGE_SYSTEM: &str = "You are a supportive accountability coach. Generate a single \
specific, actionable daily challenge for two accountability partners who share similar setbacks. \
The challenge should be doable in 15-30 minutes, encourage collaboration between the two \
partners, and directly relate to overcoming their shared struggles. Keep it to 1-2 sentences. \
Don't use emojis.";

const SUPPORT_SYSTEM: &str = "You are a compassionate AI companion in a community for people \
going through setbacks. When someone shares a failure, provide a brief (2-3 sentences), \
thoughtful response that validates their feelings, reframes the setback as a growth opportunity, \
and offers one small actionable next step. Be genuine and conversational, not preachy. Don't use \
emojis.";

const GOAL_FAILURES_SYSTEM: &str = "You are a helpful assistant for a community app about \
overcoming setbacks. Given a user's goal, generate exactly 4 common challenges or setbacks people \
face when pursuing that specific goal. Return ONLY a JSON array of 4 short strings (each 2-5 \
words). No numbering, no explanation, just the JSON array. Example: [\"Failed interview\",\
\"Imposter syndrome\",\"Burnout\",\"Rejected promotion\"]";

// ─── Fallback Content ───────────────────────────────────────────

const FALLBACK_ENCOURAGEMENTS: &[&str] = &[
    "Every setback is a setup for a comeback. You got this.",
    "The fact that you tried means you're already ahead. Keep going.",
    "Failure is just feedback. You're learning and growing.",
    "It's okay to fall. What matters is getting back up. You're not alone.",
    "Your resilience is inspiring. Keep pushing forward.",
];

const FALLBACK_CHALLENGES: &[&str] = &[
    "Share one lesson you learned from your failure with your match and discuss how to apply it this week.",
    "Set a micro-goal for this week and check in with each other tomorrow to track progress.",
    "Spend 15 minutes brainstorming creative solutions to each other's biggest current obstacle.",
    "Write down 3 things you're grateful for despite the setback, then share and discuss them together.",
    "Practice your pitch or plan with each other for 5 minutes, then give honest feedback.",
];

const FALLBACK_SUPPORT: &[&str] = &[
    "Thank you for sharing this. Setbacks like this hurt, and it takes courage to say it out loud. Pick one small step you can take tomorrow and let the community cheer you on.",
    "What you're feeling makes sense, and it doesn't define you. Treat this as information about what to try differently, and choose one tiny action for this week.",
    "You're not alone in this; many people here have been exactly where you are. Rest if you need to, then write down one thing you'd do differently next time.",
];

/// Number of setbacks suggested for a goal.
pub const GOAL_FAILURE_COUNT: usize = 4;

const GOAL_FAILURE_FALLBACKS: &[(&[&str], [&str; GOAL_FAILURE_COUNT])] = &[
    (
        &["startup", "business", "company"],
        [
            "Funding rejected",
            "Co-founder conflict",
            "Product-market fit issues",
            "Burnout",
        ],
    ),
    (
        &["job", "career", "interview"],
        [
            "Failed interview",
            "Rejected promotion",
            "Imposter syndrome",
            "Burnout",
        ],
    ),
    (
        &["fitness", "marathon", "health", "weight"],
        [
            "Quit exercise routine",
            "Diet failed",
            "Injury setback",
            "Lost motivation",
        ],
    ),
    (
        &["learn", "study", "degree", "exam"],
        [
            "Failed exam",
            "Rejected from program",
            "Writer's block",
            "Imposter syndrome",
        ],
    ),
];

const GENERIC_GOAL_FAILURES: [&str; GOAL_FAILURE_COUNT] = [
    "Unexpected setback",
    "Lost motivation",
    "Imposter syndrome",
    "Burnout",
];

fn pick(options: &[&str]) -> String {
    options
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
        .to_string()
}

/// Keyword-matched setbacks for a goal, or a generic list.
pub fn fallback_goal_failures(goal: &str) -> Vec<String> {
    let lower = goal.to_lowercase();
    let list = GOAL_FAILURE_FALLBACKS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, list)| list)
        .unwrap_or(&GENERIC_GOAL_FAILURES);
    list.iter().map(|s| s.to_string()).collect()
}

/// Parse a JSON array reply into exactly four setbacks.
fn parse_goal_failures(reply: &str) -> Result<Vec<String>, ContentError> {
    let items: Vec<serde_json::Value> =
        serde_json::from_str(reply.trim()).map_err(|e| ContentError::Malformed(e.to_string()))?;

    let failures: Vec<String> = items
        .iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        })
        .filter(|s| !s.is_empty())
        .take(GOAL_FAILURE_COUNT)
        .collect();

    if failures.len() < GOAL_FAILURE_COUNT {
        return Err(ContentError::Malformed(format!(
            "expected {} items, got {}",
            GOAL_FAILURE_COUNT,
            failures.len()
        )));
    }
    Ok(failures)
}

// ─── Service ────────────────────────────────────────────────────

/// Generates enrichment copy with local fallbacks.
#[derive(Clone)]
pub struct ContentService {
    generator: Arc<dyn TextGenerator>,
}

impl ContentService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Short encouragement for someone who shared `post_content`.
    pub async fn encouragement(&self, post_content: &str) -> String {
        let prompt = Prompt {
            system: ENCOURAGEMENT_SYSTEM,
            user: format!(
                "Someone shared this setback: \"{}\". Write a brief, personal encouragement message for them.",
                post_content
            ),
            max_tokens: 150,
            temperature: 0.8,
        };
        match self.generator.complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                log_degraded("encouragement", &e);
                pick(FALLBACK_ENCOURAGEMENTS)
            }
        }
    }

    /// Joint daily challenge for two partners.
    pub async fn challenge(&self, failures: &[String], goal: Option<&str>) -> String {
        let setbacks = failures.join(", ");
        let context = match goal.filter(|g| !g.trim().is_empty()) {
            Some(goal) => format!(
                "Their goal is: \"{}\". Their setbacks include: {}.",
                goal, setbacks
            ),
            None => format!("Their setbacks include: {}.", setbacks),
        };
        let prompt = Prompt {
            system: CHALLENGE_SYSTEM,
            user: format!("Create a daily challenge for two partners. {}", context),
            max_tokens: 100,
            temperature: 0.9,
        };
        match self.generator.complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                log_degraded("challenge", &e);
                pick(FALLBACK_CHALLENGES)
            }
        }
    }

    /// Empathetic reply attached to a new post.
    pub async fn support_response(&self, post_content: &str) -> String {
        let prompt = Prompt {
            system: SUPPORT_SYSTEM,
            user: format!(
                "Someone just shared this setback: \"{}\". Respond with empathy and a helpful nudge forward.",
                post_content
            ),
            max_tokens: 150,
            temperature: 0.7,
        };
        match self.generator.complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                log_degraded("support_response", &e);
                pick(FALLBACK_SUPPORT)
            }
        }
    }

    /// Four likely setbacks for someone pursuing `goal`.
    pub async fn goal_failures(&self, goal: &str) -> Vec<String> {
        let prompt = Prompt {
            system: GOAL_FAILURES_SYSTEM,
            user: format!(
                "Goal: \"{}\". What are 4 common setbacks people face pursuing this goal?",
                goal
            ),
            max_tokens: 150,
            temperature: 0.7,
        };
        let reply = self.generator.complete(prompt).await;
        match reply.and_then(|text| parse_goal_failures(&text)) {
            Ok(failures) => failures,
            Err(e) => {
                log_degraded("goal_failures", &e);
                fallback_goal_failures(goal)
            }
        }
    }
}

fn log_degraded(capability: &'static str, error: &ContentError) {
    tracing::warn!(capability, error = %error, "Content service degraded, using fallback");
}
