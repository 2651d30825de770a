use crate::config::SessionConfig;
use crate::context::Context;
use crate::error::Result;
use crate::middleware::{InboundAction, InboundMiddleware, OutboundMiddleware};
use crate::session::store::SessionStore;
use crate::session::Session;
use async_trait::async_trait;
use std::sync::Arc;

/// Session middleware using the dual-phase pattern
///
/// Inbound: loads or creates the request's `Session` from the cookie id.
/// Outbound: persists or destroys it and sets the cookie — exactly once per
/// request, and (via the chain's capture guarantee) even when the handler
/// failed.
#[derive(Clone)]
pub struct SessionMiddleware {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionMiddleware {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Check if route is exempt from session handling
    fn is_route_exempt(&self, path: &str) -> bool {
        self.config
            .exempt_routes
            .iter()
            .any(|pattern| Self::matches_pattern(path, pattern))
    }

    /// Simple glob matching: exact paths and `/prefix/*` suffix patterns
    fn matches_pattern(path: &str, pattern: &str) -> bool {
        if let Some(prefix) = pattern.strip_suffix("/*") {
            match path.strip_prefix(prefix) {
                Some(remaining) => remaining.is_empty() || remaining.starts_with('/'),
                None => false,
            }
        } else {
            path == pattern
        }
    }

    /// Session cookie for the given id, with all configured attributes
    fn create_cookie(&self, session_id: &str) -> String {
        let cookie_config = &self.config.cookie;
        let mut cookie = format!("{}={}", cookie_config.name, session_id);

        cookie.push_str(&format!("; Path={}", cookie_config.path));

        if let Some(ref domain) = cookie_config.domain {
            cookie.push_str(&format!("; Domain={}", domain));
        }

        if cookie_config.secure {
            cookie.push_str("; Secure");
        }

        if cookie_config.http_only {
            cookie.push_str("; HttpOnly");
        }

        cookie.push_str(&format!("; SameSite={}", cookie_config.same_site));

        // Max-Age mirrors the store TTL
        cookie.push_str(&format!("; Max-Age={}", self.config.ttl.as_secs()));

        cookie
    }

    /// Deletion cookie sent when the session was invalidated
    fn create_destroy_cookie(&self) -> String {
        let cookie_config = &self.config.cookie;
        let mut cookie = format!("{}=", cookie_config.name);

        cookie.push_str(&format!("; Path={}", cookie_config.path));

        if let Some(ref domain) = cookie_config.domain {
            cookie.push_str(&format!("; Domain={}", domain));
        }

        cookie.push_str("; Max-Age=0");
        cookie.push_str("; Expires=Thu, 01 Jan 1970 00:00:00 GMT");

        cookie
    }
}

#[async_trait]
impl InboundMiddleware for SessionMiddleware {
    async fn process_request(&self, ctx: &mut Context) -> Result<InboundAction> {
        if self.is_route_exempt(ctx.req.path()) {
            return Ok(InboundAction::Continue);
        }

        let cookie_id = ctx.req.cookie(&self.config.cookie.name);

        // A store failure propagates here: an outage must surface as an
        // error response, never as a silently empty (anonymous) session.
        let session = match cookie_id {
            Some(ref id) => match self.store.read(id).await? {
                Some(data) => Session::from_data(id, data),
                None => {
                    log::debug!("Session {} absent or expired, creating new", id);
                    Session::create()
                }
            },
            None => Session::create(),
        };

        ctx.set_session(session);
        Ok(InboundAction::Capture)
    }

    fn name(&self) -> &'static str {
        "session"
    }

    fn priority(&self) -> i32 {
        -500 // Run early, before auth and application middleware
    }
}

#[async_trait]
impl OutboundMiddleware for SessionMiddleware {
    async fn process_response(&self, ctx: &mut Context) -> Result<()> {
        let session = match ctx.session() {
            Some(session) => session.clone(),
            None => return Ok(()),
        };

        if session.is_destroyed() {
            self.store.destroy(session.original_id()).await?;
            log::debug!("Session {} destroyed", session.original_id());

            if let Some(response) = ctx.res.as_mut() {
                response.add_header("Set-Cookie", &self.create_destroy_cookie());
            }
            return Ok(());
        }

        if session.was_regenerated()
            && self.config.destroy_previous_on_regenerate
            && session.original_id() != session.id()
        {
            self.store.destroy(session.original_id()).await?;
            log::debug!(
                "Session id rotated, previous entry {} destroyed",
                session.original_id()
            );
        }

        // Dirty and new sessions persist their data; untouched sessions get
        // the same write under the unchanged id, which is what implements
        // sliding expiration (fresh TTL, re-issued cookie).
        let snapshot = session.to_data()?;
        let current_id = session.id();
        self.store
            .write(&current_id, &snapshot, self.config.ttl)
            .await?;

        if let Some(response) = ctx.res.as_mut() {
            response.add_header("Set-Cookie", &self.create_cookie(&current_id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_glob_matching() {
        assert!(SessionMiddleware::matches_pattern("/static/app.css", "/static/*"));
        assert!(SessionMiddleware::matches_pattern("/static", "/static/*"));
        assert!(!SessionMiddleware::matches_pattern("/staticfile", "/static/*"));
        assert!(SessionMiddleware::matches_pattern("/health", "/health"));
        assert!(!SessionMiddleware::matches_pattern("/healthz", "/health"));
    }
}
