use crate::auth::guard::SessionGuard;
use crate::auth::provider::UserProvider;
use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::session::Session;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

type ProviderFactory = Box<dyn Fn() -> Arc<dyn UserProvider> + Send + Sync>;

/// Registry of named guards and providers
///
/// An explicitly constructed object owned by the application and handed to
/// request setup — never a module-level global. Provider factories are
/// memoized to singletons on first use; guards are instantiated fresh per
/// request by `create_context`.
pub struct AuthManager {
    config: AuthConfig,
    provider_factories: HashMap<String, ProviderFactory>,
    provider_instances: RwLock<HashMap<String, Arc<dyn UserProvider>>>,
    /// guard name -> provider name
    guards: HashMap<String, String>,
}

impl AuthManager {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            provider_factories: HashMap::new(),
            provider_instances: RwLock::new(HashMap::new()),
            guards: HashMap::new(),
        }
    }

    /// Standard wiring: one provider under "users", one guard under "web"
    /// (the default guard name)
    pub fn with_users(provider: Arc<dyn UserProvider>) -> Self {
        let mut manager = Self::new(AuthConfig::default());
        manager.register_provider("users", move || Arc::clone(&provider));
        manager.register_guard("web", "users");
        manager
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Register a named provider factory (memoized on first use)
    pub fn register_provider<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Arc<dyn UserProvider> + Send + Sync + 'static,
    {
        self.provider_factories
            .insert(name.to_string(), Box::new(factory));
    }

    /// Register a named guard backed by a registered provider
    pub fn register_guard(&mut self, guard_name: &str, provider_name: &str) {
        self.guards
            .insert(guard_name.to_string(), provider_name.to_string());
    }

    /// Resolve a provider by name, creating and caching it on first use
    pub fn provider(&self, name: &str) -> Result<Arc<dyn UserProvider>> {
        if let Ok(instances) = self.provider_instances.read() {
            if let Some(provider) = instances.get(name) {
                return Ok(Arc::clone(provider));
            }
        }

        let factory = self
            .provider_factories
            .get(name)
            .ok_or_else(|| Error::config(format!("Provider '{}' is not registered", name)))?;
        let provider = factory();

        if let Ok(mut instances) = self.provider_instances.write() {
            // A concurrent first use may have won the race; keep theirs
            return Ok(Arc::clone(
                instances
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::clone(&provider)),
            ));
        }
        Ok(provider)
    }

    /// Build the per-request auth facade bound to the request's session
    pub fn create_context(self: &Arc<Self>, session: Session) -> AuthContext {
        AuthContext {
            manager: Arc::clone(self),
            session,
            guards: Mutex::new(HashMap::new()),
        }
    }
}

/// Request-facing authentication facade
///
/// Caches guard instances per name for the request's lifetime, so
/// `guard("web")` twice returns the same object and its memoized user
/// survives between calls.
pub struct AuthContext {
    manager: Arc<AuthManager>,
    session: Session,
    guards: Mutex<HashMap<String, Arc<SessionGuard>>>,
}

impl AuthContext {
    /// Resolve a guard by name
    ///
    /// Requesting an unregistered guard is a configuration error, surfaced
    /// immediately.
    pub fn guard(&self, name: &str) -> Result<Arc<SessionGuard>> {
        if let Ok(guards) = self.guards.lock() {
            if let Some(guard) = guards.get(name) {
                return Ok(Arc::clone(guard));
            }
        }

        let provider_name = self
            .manager
            .guards
            .get(name)
            .ok_or_else(|| Error::config(format!("Guard '{}' is not registered", name)))?;
        let provider = self.manager.provider(provider_name)?;

        let guard = Arc::new(SessionGuard::new(
            name,
            self.session.clone(),
            provider,
            self.manager.config.clone(),
        ));

        if let Ok(mut guards) = self.guards.lock() {
            return Ok(Arc::clone(
                guards
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::clone(&guard)),
            ));
        }
        Ok(guard)
    }

    /// The configured default guard
    pub fn default_guard(&self) -> Result<Arc<SessionGuard>> {
        let name = self.manager.config.default_guard.clone();
        self.guard(&name)
    }
}
