//! Guard-based authentication over the session layer
//!
//! A `SessionGuard` binds one request's `Session` to a `UserProvider` and
//! exposes the check/login/logout/attempt surface; the `AuthManager` is
//! the registry that wires named guards to named providers and hands each
//! request an `AuthContext` facade.

pub mod credentials;
pub mod guard;
pub mod hasher;
pub mod manager;
pub mod middleware;
pub mod principal;
pub mod provider;

pub use credentials::Credentials;
pub use guard::{SessionGuard, REMEMBER_TOKEN_LENGTH};
pub use hasher::{Argon2Hasher, Hasher};
pub use manager::{AuthContext, AuthManager};
pub use middleware::AuthMiddleware;
pub use principal::{Authenticatable, Principal};
pub use provider::{MemoryUserProvider, UserProvider};
