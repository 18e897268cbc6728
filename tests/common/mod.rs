// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rebound::config::Config;
use rebound::db::{FirestoreDb, MemoryStore, Store};
use rebound::routes::create_router;
use rebound::services::content::Prompt;
use rebound::services::{ContentError, ContentService, TextGenerator};
use rebound::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Text generator that fails every call, forcing fallback content.
pub struct FailingGenerator;

#[async_trait::async_trait]
impl TextGenerator for FailingGenerator {
    async fn complete(&self, _prompt: Prompt<'_>) -> Result<String, ContentError> {
        Err(ContentError::Status(503, "unavailable".to_string()))
    }
}

/// Text generator that always answers with the same text.
#[allow(dead_code)]
pub struct FixedGenerator(pub &'static str);

#[async_trait::async_trait]
impl TextGenerator for FixedGenerator {
    async fn complete(&self, _prompt: Prompt<'_>) -> Result<String, ContentError> {
        Ok(self.0.to_string())
    }
}

/// Create a test app on the in-memory store whose content service always fails.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with(Arc::new(FailingGenerator), Config::default())
}

#[allow(dead_code)]
pub fn create_test_app_with(
    generator: Arc<dyn TextGenerator>,
    config: Config,
) -> (Router, Arc<AppState>) {
    let db: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(config, db, ContentService::new(generator)));
    (create_router(state.clone()), state)
}

/// Send a JSON request and decode the JSON response.
#[allow(dead_code)]
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[allow(dead_code)]
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    send_json(app, "GET", uri, None).await
}

#[allow(dead_code)]
pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send_json(app, "POST", uri, Some(body)).await
}

/// Onboard a user through the API and return its id.
#[allow(dead_code)]
pub async fn onboard(app: &Router, category: &str, failures: &[&str]) -> String {
    let (status, user) = post_json(
        app,
        "/api/users",
        serde_json::json!({
            "category": category,
            "goal": "Bounce back",
            "failures": failures,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "onboarding failed: {}", user);
    user["id"].as_str().unwrap().to_string()
}
