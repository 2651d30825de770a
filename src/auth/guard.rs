use crate::auth::credentials::Credentials;
use crate::auth::principal::Principal;
use crate::auth::provider::UserProvider;
use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::utils::secure_token;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Length of generated remember tokens
pub const REMEMBER_TOKEN_LENGTH: usize = 60;

/// Memoized user resolution for one guard's lifetime
///
/// An explicit tri-state rather than a nested `Option`, so "not yet
/// resolved" and "resolved to anonymous" cannot be confused.
enum UserResolution {
    Unresolved,
    Anonymous,
    Authenticated(Principal),
}

/// Session-based authentication guard
///
/// Binds one `Session` to one `UserProvider` for the duration of a request.
/// The resolved user is memoized, so repeated `user()`/`check()` calls hit
/// the provider at most once per request.
pub struct SessionGuard {
    name: String,
    session: Session,
    provider: Arc<dyn UserProvider>,
    config: AuthConfig,
    resolution: Mutex<UserResolution>,
}

impl SessionGuard {
    pub fn new(
        name: &str,
        session: Session,
        provider: Arc<dyn UserProvider>,
        config: AuthConfig,
    ) -> Self {
        Self {
            name: name.to_string(),
            session,
            provider,
            config,
            resolution: Mutex::new(UserResolution::Unresolved),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a principal is authenticated for this request
    pub async fn check(&self) -> Result<bool> {
        Ok(self.user().await?.is_some())
    }

    /// The authenticated principal, resolving (and memoizing) if needed
    pub async fn user(&self) -> Result<Option<Principal>> {
        let mut resolution = self.resolution.lock().await;
        self.resolve_user(&mut resolution).await
    }

    /// The authenticated principal's id
    ///
    /// Cheap path: reads the session identity key directly, falling back to
    /// a full resolution only when the key is absent.
    pub async fn id(&self) -> Result<Option<String>> {
        if let Some(id) = self.session.get::<String>(&self.config.identity_key) {
            return Ok(Some(id));
        }
        Ok(self.user().await?.map(|user| user.auth_id()))
    }

    /// Log a principal in
    ///
    /// Sets the session identity key and memoizes the principal. With
    /// `remember`, a fresh remember token is generated, persisted on the
    /// principal via the provider and stored in the session; without it,
    /// only the session-side remember key is cleared — the stored token
    /// stays valid for other devices.
    pub async fn login(&self, user: &Principal, remember: bool) -> Result<()> {
        // Refuse before touching the session, so a failed remember login
        // leaves no identity key behind at writeback
        if remember && !self.provider.supports_remember() {
            return Err(Error::config(format!(
                "Provider for guard '{}' does not support remember-me",
                self.name
            )));
        }

        self.session.set(&self.config.identity_key, user.auth_id())?;

        if remember {
            let token = secure_token(REMEMBER_TOKEN_LENGTH);
            self.provider.set_remember_token(user, Some(&token)).await?;
            self.session.set(&self.config.remember_key, token)?;
        } else {
            self.session.forget(&self.config.remember_key);
        }

        let mut resolution = self.resolution.lock().await;
        *resolution = UserResolution::Authenticated(Arc::clone(user));
        log::debug!("Guard '{}': logged in user {}", self.name, user.auth_id());
        Ok(())
    }

    /// De-authenticate for the remainder of the request
    ///
    /// Clears the identity and remember keys and pins the memo to
    /// anonymous. Does not invalidate the session — the caller decides
    /// whether full destruction is wanted, which lets flash data survive a
    /// logout redirect.
    pub async fn logout(&self) {
        self.session.forget(&self.config.identity_key);
        self.session.forget(&self.config.remember_key);

        let mut resolution = self.resolution.lock().await;
        *resolution = UserResolution::Anonymous;
        log::debug!("Guard '{}': logged out", self.name);
    }

    /// Look up and verify credentials, logging in on success
    ///
    /// A wrong password or unknown user is an ordinary `false`, never an
    /// error.
    pub async fn attempt(&self, credentials: &Credentials, remember: bool) -> Result<bool> {
        match self.validate(credentials).await? {
            Some(user) => {
                self.login(&user, remember).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Pure lookup + verify with no session side effects
    pub async fn validate(&self, credentials: &Credentials) -> Result<Option<Principal>> {
        let user = match self.provider.retrieve_by_credentials(credentials).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        if self.provider.validate_credentials(&user, credentials).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Two-tier resolution: identity key first, remember token as fallback
    ///
    /// Dangling references self-heal by forgetting the stale session key,
    /// so a deleted user's session fails fast instead of re-querying the
    /// provider every request.
    async fn resolve_user(
        &self,
        resolution: &mut UserResolution,
    ) -> Result<Option<Principal>> {
        // An invalidated session authenticates nobody for the rest of the
        // request, even if a principal was already memoized.
        if self.session.is_destroyed() {
            return Ok(None);
        }

        match resolution {
            UserResolution::Authenticated(user) => return Ok(Some(Arc::clone(user))),
            UserResolution::Anonymous => return Ok(None),
            UserResolution::Unresolved => {}
        }

        if let Some(id) = self.session.get::<String>(&self.config.identity_key) {
            if let Some(user) = self.provider.retrieve_by_id(&id).await? {
                *resolution = UserResolution::Authenticated(Arc::clone(&user));
                return Ok(Some(user));
            }
            // Stale id: the principal was deleted. Heal the session and
            // fall through to the remember-token path.
            log::debug!(
                "Guard '{}': identity key pointed at missing principal {}, forgetting",
                self.name,
                id
            );
            self.session.forget(&self.config.identity_key);
        }

        self.resolve_via_remember_token(resolution).await
    }

    async fn resolve_via_remember_token(
        &self,
        resolution: &mut UserResolution,
    ) -> Result<Option<Principal>> {
        let token = match self.session.get::<String>(&self.config.remember_key) {
            Some(token) => token,
            None => {
                *resolution = UserResolution::Anonymous;
                return Ok(None);
            }
        };

        let credentials = Credentials::remember(token.clone());
        let user = match self.provider.retrieve_by_credentials(&credentials).await? {
            Some(user) => user,
            None => {
                self.session.forget(&self.config.remember_key);
                *resolution = UserResolution::Anonymous;
                return Ok(None);
            }
        };

        // The canonical token on the principal must still equal the
        // session's copy; a rotated or cleared token presented from an old
        // session is rejected.
        if user.remember_token().as_deref() != Some(token.as_str()) {
            log::debug!(
                "Guard '{}': remember token mismatch for {}, forgetting",
                self.name,
                user.auth_id()
            );
            self.session.forget(&self.config.remember_key);
            *resolution = UserResolution::Anonymous;
            return Ok(None);
        }

        // Rotate on every successful remember login, so a captured token
        // has a sliding window of validity.
        let fresh = secure_token(REMEMBER_TOKEN_LENGTH);
        self.provider.set_remember_token(&user, Some(&fresh)).await?;
        self.session.set(&self.config.remember_key, fresh)?;
        self.session.set(&self.config.identity_key, user.auth_id())?;

        log::debug!(
            "Guard '{}': resolved {} via remember token",
            self.name,
            user.auth_id()
        );
        *resolution = UserResolution::Authenticated(Arc::clone(&user));
        Ok(Some(user))
    }
}
