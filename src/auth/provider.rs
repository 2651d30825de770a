use crate::auth::credentials::Credentials;
use crate::auth::hasher::Hasher;
use crate::auth::principal::{Authenticatable, Principal};
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, RwLock};

/// Lookup and verification strategy for turning credentials or an id into
/// a principal
///
/// Negative lookups are `Ok(None)` and failed verification is `Ok(false)`;
/// errors are reserved for backend failures.
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Retrieve a principal by its stable identifier
    async fn retrieve_by_id(&self, id: &str) -> Result<Option<Principal>>;

    /// Retrieve a principal by credential match
    ///
    /// Looks up by remember token first when the credentials carry one,
    /// otherwise by the username field.
    async fn retrieve_by_credentials(&self, credentials: &Credentials)
        -> Result<Option<Principal>>;

    /// Verify the plaintext secret against the principal's stored hash
    async fn validate_credentials(
        &self,
        user: &Principal,
        credentials: &Credentials,
    ) -> Result<bool>;

    /// Persist a new remember token (or clear it with `None`)
    ///
    /// Providers that do not support remember-me treat this as a no-op and
    /// return `false` from `supports_remember`; the guard then refuses
    /// remember-me logins for them.
    async fn set_remember_token(&self, user: &Principal, token: Option<&str>) -> Result<()>;

    fn supports_remember(&self) -> bool {
        false
    }
}

/// User record held by the in-memory provider
struct MemoryUser {
    id: String,
    username: String,
    password_hash: RwLock<String>,
    remember_token: RwLock<Option<String>>,
}

impl Authenticatable for MemoryUser {
    fn auth_id(&self) -> String {
        self.id.clone()
    }

    fn password_hash(&self) -> String {
        self.password_hash
            .read()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    fn remember_token(&self) -> Option<String> {
        self.remember_token.read().ok().and_then(|t| t.clone())
    }
}

/// DashMap-backed reference provider
///
/// Useful for tests, demos and small deployments; a database-backed
/// provider implements the same trait against its own storage.
pub struct MemoryUserProvider {
    users: DashMap<String, Arc<MemoryUser>>,
    hasher: Arc<dyn Hasher>,
}

impl MemoryUserProvider {
    pub fn new(hasher: Arc<dyn Hasher>) -> Self {
        Self {
            users: DashMap::new(),
            hasher,
        }
    }

    /// Add a user, hashing the given plaintext password
    pub fn add_user(&self, id: &str, username: &str, password: &str) -> Result<()> {
        let password_hash = self.hasher.hash(password)?;
        let user = Arc::new(MemoryUser {
            id: id.to_string(),
            username: username.to_string(),
            password_hash: RwLock::new(password_hash),
            remember_token: RwLock::new(None),
        });
        self.users.insert(id.to_string(), user);
        Ok(())
    }

    /// Remove a user (simulates principal deletion)
    pub fn remove_user(&self, id: &str) {
        self.users.remove(id);
    }

    /// Peek at a user's stored remember token (for tests and admin tooling)
    pub fn stored_remember_token(&self, id: &str) -> Option<String> {
        self.users
            .get(id)
            .and_then(|user| user.value().remember_token())
    }

    /// Overwrite a user's stored remember token directly
    pub fn force_remember_token(&self, id: &str, token: Option<&str>) {
        if let Some(user) = self.users.get(id) {
            if let Ok(mut stored) = user.value().remember_token.write() {
                *stored = token.map(|t| t.to_string());
            }
        }
    }
}

#[async_trait]
impl UserProvider for MemoryUserProvider {
    async fn retrieve_by_id(&self, id: &str) -> Result<Option<Principal>> {
        Ok(self
            .users
            .get(id)
            .map(|user| Arc::clone(user.value()) as Principal))
    }

    async fn retrieve_by_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Principal>> {
        // Remember-token lookup takes precedence over username lookup
        if let Some(ref token) = credentials.remember_token {
            for entry in self.users.iter() {
                if entry.value().remember_token().as_deref() == Some(token.as_str()) {
                    return Ok(Some(Arc::clone(entry.value()) as Principal));
                }
            }
            return Ok(None);
        }

        if let Some(ref username) = credentials.username {
            for entry in self.users.iter() {
                if entry.value().username == *username {
                    return Ok(Some(Arc::clone(entry.value()) as Principal));
                }
            }
        }

        Ok(None)
    }

    async fn validate_credentials(
        &self,
        user: &Principal,
        credentials: &Credentials,
    ) -> Result<bool> {
        let plaintext = match credentials.password {
            Some(ref plaintext) => plaintext,
            None => return Ok(false),
        };
        Ok(self.hasher.verify(plaintext, &user.password_hash()))
    }

    async fn set_remember_token(&self, user: &Principal, token: Option<&str>) -> Result<()> {
        if let Some(record) = self.users.get(&user.auth_id()) {
            if let Ok(mut stored) = record.value().remember_token.write() {
                *stored = token.map(|t| t.to_string());
            }
        }
        Ok(())
    }

    fn supports_remember(&self) -> bool {
        true
    }
}
