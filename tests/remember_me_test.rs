//! Remember-me token lifecycle: rotation on login and on resolution,
//! recovery of an identity from a remember-only session, and rejection of
//! stale tokens.

use authgate::auth::hasher::Argon2Hasher;
use authgate::prelude::*;
use authgate::{MemoryUserProvider, SessionGuard};
use std::sync::Arc;

fn provider() -> Arc<MemoryUserProvider> {
    let hasher = Arc::new(Argon2Hasher::with_params(8, 1, 1).unwrap());
    let provider = MemoryUserProvider::new(hasher);
    provider.add_user("1", "a@b.com", "secret").unwrap();
    Arc::new(provider)
}

fn guard_over(session: Session, provider: Arc<MemoryUserProvider>) -> SessionGuard {
    SessionGuard::new(
        "web",
        session,
        provider as Arc<dyn UserProvider>,
        AuthConfig::default(),
    )
}

#[tokio::test]
async fn test_remember_login_stores_matching_tokens() {
    let provider = provider();
    let session = Session::create();
    let guard = guard_over(session.clone(), Arc::clone(&provider));

    let good = Credentials::password("a@b.com", "secret");
    assert!(guard.attempt(&good, true).await.unwrap());

    let session_token = session.get::<String>("auth:remember_token").unwrap();
    let stored_token = provider.stored_remember_token("1").unwrap();
    assert_eq!(session_token, stored_token);
    assert_eq!(session_token.len(), authgate::auth::REMEMBER_TOKEN_LENGTH);
}

#[tokio::test]
async fn test_each_remember_login_rotates_the_token() {
    let provider = provider();

    let first_session = Session::create();
    let first_guard = guard_over(first_session.clone(), Arc::clone(&provider));
    let good = Credentials::password("a@b.com", "secret");
    assert!(first_guard.attempt(&good, true).await.unwrap());
    let first_token = first_session.get::<String>("auth:remember_token").unwrap();

    // A second device logs in with remember; the canonical token moves on
    let second_session = Session::create();
    let second_guard = guard_over(second_session.clone(), Arc::clone(&provider));
    assert!(second_guard.attempt(&good, true).await.unwrap());
    let second_token = second_session.get::<String>("auth:remember_token").unwrap();

    assert_ne!(first_token, second_token);
    assert_eq!(provider.stored_remember_token("1").unwrap(), second_token);
}

#[tokio::test]
async fn test_remember_only_session_resolves_and_rotates() {
    let provider = provider();
    provider.force_remember_token("1", Some("long-lived-token"));

    // A session carrying only the remember key, as after expiry of the
    // identity key's original session
    let session = Session::create();
    session
        .set("auth:remember_token", "long-lived-token")
        .unwrap();

    let guard = guard_over(session.clone(), Arc::clone(&provider));
    let user = guard.user().await.unwrap().unwrap();
    assert_eq!(user.auth_id(), "1");

    // Identity key restored and the token rotated away from the old value
    assert_eq!(session.get::<String>("auth:user_id").unwrap(), "1");
    let rotated = session.get::<String>("auth:remember_token").unwrap();
    assert_ne!(rotated, "long-lived-token");
    assert_eq!(provider.stored_remember_token("1").unwrap(), rotated);
}

#[tokio::test]
async fn test_stale_remember_token_is_rejected_and_forgotten() {
    let provider = provider();
    provider.force_remember_token("1", Some("current"));

    let session = Session::create();
    session.set("auth:remember_token", "current").unwrap();

    // The canonical token rotates (say, another device logged in) before
    // this session presents its copy
    provider.force_remember_token("1", Some("rotated-elsewhere"));

    let guard = guard_over(session.clone(), Arc::clone(&provider));
    assert!(guard.user().await.unwrap().is_none());
    assert!(!session.has("auth:remember_token"));
}

#[tokio::test]
async fn test_unknown_remember_token_is_forgotten() {
    let provider = provider();

    let session = Session::create();
    session.set("auth:remember_token", "never-issued").unwrap();

    let guard = guard_over(session.clone(), Arc::clone(&provider));
    assert!(!guard.check().await.unwrap());
    assert!(!session.has("auth:remember_token"));
}

#[tokio::test]
async fn test_plain_login_clears_session_remember_key_only() {
    let provider = provider();
    let session = Session::create();
    let guard = guard_over(session.clone(), Arc::clone(&provider));

    let good = Credentials::password("a@b.com", "secret");
    assert!(guard.attempt(&good, true).await.unwrap());
    let token = provider.stored_remember_token("1").unwrap();

    // Logging in again without remember drops the session-side key but
    // leaves the stored token valid for other devices
    let session2 = Session::create();
    let guard2 = guard_over(session2.clone(), Arc::clone(&provider));
    assert!(guard2.attempt(&good, false).await.unwrap());

    assert!(!session2.has("auth:remember_token"));
    assert_eq!(provider.stored_remember_token("1").unwrap(), token);
}
