//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development. Nothing here is secret
//! except the optional text-generation API key.

use std::env;
use std::str::FromStr;

/// Which entity store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Google Cloud Firestore (or its emulator).
    Firestore,
    /// Process-local store; data is lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// How matchmaking picks a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Highest failure-tag overlap wins, first maximum on ties.
    TagOverlap,
    /// Uniform random pick among users sharing the requester's category.
    Category,
}

impl FromStr for MatchPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tag_overlap" => Ok(Self::TagOverlap),
            "category" => Ok(Self::Category),
            _ => Err(ConfigError::Invalid("MATCH_POLICY", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Entity store implementation
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,
    /// Base URL of the OpenAI-compatible chat completions API
    pub content_api_url: String,
    /// API key for the text-generation service; fallbacks are used when unset
    pub content_api_key: Option<String>,
    /// Model requested from the text-generation service
    pub content_model: String,
    /// Per-request timeout for the text-generation service
    pub content_timeout_secs: u64,
    /// Partner selection policy
    pub match_policy: MatchPolicy,
    /// Seed demo users and posts when the store is empty
    pub seed_demo_data: bool,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            content_api_url: "http://127.0.0.1:9".to_string(),
            content_api_key: None,
            content_model: "MiniMax-M1".to_string(),
            content_timeout_secs: 1,
            match_policy: MatchPolicy::TagOverlap,
            seed_demo_data: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let gcp_project_id = env::var("GCP_PROJECT_ID").ok();
        let store_backend = match env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) if gcp_project_id.is_some() => StoreBackend::Firestore,
            Err(_) => StoreBackend::Memory,
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            store_backend,
            gcp_project_id: gcp_project_id.unwrap_or_else(|| "local-dev".to_string()),
            content_api_url: env::var("CONTENT_API_URL")
                .unwrap_or_else(|_| "https://api.minimax.io/v1".to_string()),
            content_api_key: env::var("CONTENT_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            content_model: env::var("CONTENT_MODEL").unwrap_or_else(|_| "MiniMax-M1".to_string()),
            content_timeout_secs: match env::var("CONTENT_TIMEOUT_SECS") {
                Ok(raw) => raw
                    .parse()
                    .map_err(|_| ConfigError::Invalid("CONTENT_TIMEOUT_SECS", raw))?,
                Err(_) => 10,
            },
            match_policy: match env::var("MATCH_POLICY") {
                Ok(raw) => raw.parse()?,
                Err(_) => MatchPolicy::TagOverlap,
            },
            seed_demo_data: env::var("SEED_DEMO_DATA")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!(
            " Firestore ".parse::<StoreBackend>().unwrap(),
            StoreBackend::Firestore
        );
        assert!(matches!(
            "postgres".parse::<StoreBackend>(),
            Err(ConfigError::Invalid("STORE_BACKEND", _))
        ));
    }

    #[test]
    fn test_match_policy_parse() {
        assert_eq!(
            "tag_overlap".parse::<MatchPolicy>().unwrap(),
            MatchPolicy::TagOverlap
        );
        assert_eq!("category".parse::<MatchPolicy>().unwrap(), MatchPolicy::Category);
        assert!("random".parse::<MatchPolicy>().is_err());
    }

    #[test]
    fn test_default_is_offline() {
        let config = Config::default();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.content_api_key.is_none());
    }
}
