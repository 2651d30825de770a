use crate::session::SameSite;
use std::time::Duration;

/// Cookie attributes for the session cookie
#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// Cookie name
    pub name: String,
    /// Cookie path
    pub path: String,
    /// Cookie domain
    pub domain: Option<String>,
    /// Cookie secure flag (HTTPS only)
    pub secure: bool,
    /// Cookie HttpOnly flag
    pub http_only: bool,
    /// Cookie SameSite attribute
    pub same_site: SameSite,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "authgate.sid".to_string(),
            path: "/".to_string(),
            domain: None,
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }
}

/// Session lifecycle configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cookie attributes; Max-Age mirrors `ttl`
    pub cookie: CookieConfig,
    /// Store entry lifetime, refreshed on every request (sliding expiration)
    pub ttl: Duration,
    /// Destroy the old store entry when the session id is regenerated.
    /// When `false` (the default) the old entry is orphaned and expires
    /// naturally.
    pub destroy_previous_on_regenerate: bool,
    /// Routes exempt from session handling (supports `/prefix/*` globs)
    pub exempt_routes: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie: CookieConfig::default(),
            ttl: Duration::from_secs(30 * 60),
            destroy_previous_on_regenerate: false,
            exempt_routes: vec![],
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Authentication layer configuration
///
/// The session keys are namespaced so they cannot collide with
/// application-level session data.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session key holding the authenticated principal's id
    pub identity_key: String,
    /// Session key holding the remember token
    pub remember_key: String,
    /// Default guard name for `AuthContext::default_guard()`
    pub default_guard: String,
    /// Credentials field used as the username lookup
    pub username_field: String,
    /// Credentials field holding the plaintext password
    pub password_field: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identity_key: "auth:user_id".to_string(),
            remember_key: "auth:remember_token".to_string(),
            default_guard: "web".to_string(),
            username_field: "email".to_string(),
            password_field: "password".to_string(),
        }
    }
}
