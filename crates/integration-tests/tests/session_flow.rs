//! Integration tests for the session lifecycle.
//!
//! Covers startup with and without a persisted token, OAuth completion,
//! token refresh and logout, checking the persisted token and the shared
//! auth header at each step.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use hugscape_core::{ProfileUpdate, UserId};
use hugscape_integration_tests::{
    Method, ScriptedResponse, TestContext, callback_query, user_json,
};
use hugscape_storefront::session::{CallbackParams, Navigation, SessionStatus};
use hugscape_storefront::storage::{KeyValueStore, TOKEN_KEY};
use secrecy::ExposeSecret;
use serde_json::json;
use tokio::sync::mpsc;

// =============================================================================
// OAuth Completion Tests
// =============================================================================

#[test]
fn test_callback_signs_in_and_persists_token() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = TestContext::on_disk(dir.path());
    let session = ctx.session();
    let (navigator, mut navigations) = mpsc::unbounded_channel();

    session.complete_oauth(
        &CallbackParams::from_query(&callback_query("abc", &user_json())),
        &navigator,
    );

    assert_eq!(session.status(), SessionStatus::Authenticated);
    let user = session.user().unwrap();
    assert_eq!(user.id, UserId::new(11));
    assert_eq!(user.extra["lastLogin"], "2024-05-02T08:30:00");
    assert_eq!(ctx.storage.load(TOKEN_KEY).unwrap().as_deref(), Some("abc"));
    assert_eq!(
        navigations.try_recv().unwrap(),
        Navigation::after("/", Duration::from_secs(2))
    );
}

#[test]
fn test_denied_callback_fails_without_touching_storage() {
    let ctx = TestContext::in_memory();
    let session = ctx.session();
    let (navigator, mut navigations) = mpsc::unbounded_channel();

    let outcome = session.complete_oauth(
        &CallbackParams::from_query("?error=access_denied"),
        &navigator,
    );

    assert_eq!(outcome.message.as_deref(), Some("Access was denied"));
    assert_eq!(
        session.status(),
        SessionStatus::Failed("Access was denied".to_string())
    );
    assert!(ctx.storage.is_empty());
    let navigation = navigations.try_recv().unwrap();
    assert_eq!(navigation.target, "/");
    assert!(navigation.delay <= Duration::from_secs(3));
}

#[test]
fn test_garbled_user_payload_fails() {
    let ctx = TestContext::in_memory();
    let session = ctx.session();
    let (navigator, _navigations) = mpsc::unbounded_channel();

    session.complete_oauth(
        &CallbackParams::from_query("?token=abc&user=%257Bbroken"),
        &navigator,
    );

    assert_eq!(
        session.status(),
        SessionStatus::Failed("Failed to process authentication data".to_string())
    );
    assert!(session.token().is_none());
    assert!(!ctx.auth.is_set());
}

// =============================================================================
// Restart Tests
// =============================================================================

#[tokio::test]
async fn test_token_from_previous_run_restores_session() {
    let dir = tempfile::tempdir().unwrap();
    {
        let ctx = TestContext::on_disk(dir.path());
        let (navigator, _navigations) = mpsc::unbounded_channel();
        ctx.session().complete_oauth(
            &CallbackParams::from_query(&callback_query("persisted", &user_json())),
            &navigator,
        );
    }

    let ctx = TestContext::on_disk(dir.path());
    ctx.respond_json("/api/auth/profile", &json!({ "user": user_json() }));
    let session = ctx.session();
    assert_eq!(session.status(), SessionStatus::Authenticating);

    session.restore().await;

    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.token().unwrap().expose_secret(), "persisted");
    assert_eq!(
        ctx.transport.requests()[0].authorization.as_deref(),
        Some("Bearer persisted")
    );
}

#[tokio::test]
async fn test_expired_token_is_forgotten_on_restart() {
    let ctx = TestContext::in_memory();
    ctx.storage.save(TOKEN_KEY, "expired").unwrap();
    ctx.transport.push(
        Method::Get,
        "/api/auth/profile",
        ScriptedResponse::status(401, r#"{"error":"Invalid token","message":"Token expired"}"#),
    );
    let session = ctx.session();

    session.restore().await;

    assert_eq!(session.status(), SessionStatus::Unauthenticated);
    assert_eq!(ctx.storage.load(TOKEN_KEY).unwrap(), None);
    assert!(!ctx.auth.is_set());
}

// =============================================================================
// Refresh / Profile / Logout Tests
// =============================================================================

#[tokio::test]
async fn test_refresh_then_profile_update_use_new_token() {
    let ctx = TestContext::in_memory();
    ctx.storage.save(TOKEN_KEY, "first").unwrap();
    ctx.respond_json("/api/auth/profile", &json!({ "user": user_json() }));
    ctx.transport.push(
        Method::Post,
        "/api/auth/refresh",
        ScriptedResponse::json(&json!({ "token": "second", "message": "Token refreshed" })),
    );
    ctx.transport.push(
        Method::Put,
        "/api/auth/profile",
        ScriptedResponse::json(&json!({
            "user": { "id": 11, "email": "parent@example.com", "name": "Sam P." },
            "message": "Saved"
        })),
    );
    let session = ctx.session();
    session.restore().await;

    session.refresh_token().await.unwrap();
    let outcome = session
        .update_profile(&ProfileUpdate {
            name: Some("Sam P.".to_string()),
            ..ProfileUpdate::default()
        })
        .await;

    assert_eq!(outcome.message(), "Saved");
    assert_eq!(session.user().unwrap().display_name(), "Sam P.");
    let put = ctx
        .transport
        .requests()
        .into_iter()
        .find(|r| r.method == Method::Put)
        .unwrap();
    assert_eq!(put.authorization.as_deref(), Some("Bearer second"));
    assert_eq!(ctx.storage.load(TOKEN_KEY).unwrap().as_deref(), Some("second"));
}

#[tokio::test]
async fn test_logout_after_sign_in_resets_everything() {
    let ctx = TestContext::in_memory();
    let session = ctx.session();
    let (navigator, _navigations) = mpsc::unbounded_channel();
    session.complete_oauth(
        &CallbackParams::from_query(&callback_query("abc", &user_json())),
        &navigator,
    );
    assert!(session.has_role("customer"));

    session.logout();

    assert_eq!(session.status(), SessionStatus::Unauthenticated);
    assert!(ctx.storage.load(TOKEN_KEY).unwrap().is_none());
    assert!(!ctx.auth.is_set());

    let err = session.fetch_profile().await.unwrap_err();
    assert_eq!(err.to_string(), "not signed in");
    assert!(ctx.transport.requests().is_empty());
}
