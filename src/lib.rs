//! authgate - session-backed authentication for Rust web services
//!
//! authgate provides the request-scoped session and guard-based
//! authentication core of a web application:
//! - Pluggable session stores (memory, Redis) with TTL expiry
//! - A per-request `Session` with dirty tracking, regenerate and
//!   invalidate semantics
//! - Credential providers, Argon2id password hashing and remember tokens
//! - Guards with memoized user resolution and an `AuthManager` registry
//! - Dual-phase middleware that makes session persistence a guaranteed
//!   cleanup action

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod middleware;
pub mod session;
pub mod utils;

// Re-export main types for public API
pub use auth::{
    Argon2Hasher, AuthContext, AuthManager, AuthMiddleware, Authenticatable, Credentials, Hasher,
    MemoryUserProvider, Principal, SessionGuard, UserProvider,
};
pub use config::{AuthConfig, CookieConfig, SessionConfig};
pub use context::Context;
pub use error::{Error, Result};
pub use http::{Request, Response};
pub use middleware::{
    InboundAction, InboundMiddleware, MiddlewareChain, MiddlewareInstance, OutboundMiddleware,
};
pub use session::middleware::SessionMiddleware;
pub use session::store::{MemorySessionStore, SessionStore, StoreStats};
#[cfg(feature = "redis")]
pub use session::redis::RedisSessionStore;
pub use session::{SameSite, Session, SessionData};

// Re-export commonly used external types
pub use serde::{Deserialize, Serialize};
pub use serde_json::{json, Value};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::auth::{
        AuthContext, AuthManager, AuthMiddleware, Credentials, SessionGuard, UserProvider,
    };
    pub use crate::config::{AuthConfig, SessionConfig};
    pub use crate::context::Context;
    pub use crate::error::{Error, Result};
    pub use crate::http::{Request, Response};
    pub use crate::middleware::{InboundAction, InboundMiddleware, MiddlewareChain, OutboundMiddleware};
    pub use crate::session::middleware::SessionMiddleware;
    pub use crate::session::store::{MemorySessionStore, SessionStore};
    pub use crate::session::Session;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::json;
}
