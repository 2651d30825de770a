use crate::auth::manager::AuthContext;
use crate::error::{Error, Result};
use crate::http::{Request, Response};
use crate::session::Session;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-request context passed through the middleware chain and handler
///
/// Owns the request, the response slot, and the request-scoped session and
/// auth facades. One Context per request; nothing here is shared across
/// concurrent requests.
pub struct Context {
    pub req: Request,
    pub res: Option<Response>,
    session: Option<Session>,
    auth: Option<Arc<AuthContext>>,
    data: HashMap<String, Value>,
}

impl Context {
    pub fn new(req: Request) -> Self {
        Self {
            req,
            res: None,
            session: None,
            auth: None,
            data: HashMap::new(),
        }
    }

    /// Store a request-scoped value
    pub fn set<T: serde::Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    /// Read a request-scoped value
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Session, or a configuration error if no session middleware ran
    pub fn session_required(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| Error::config("No session attached; is the session middleware installed?"))
    }

    pub fn set_auth(&mut self, auth: Arc<AuthContext>) {
        self.auth = Some(auth);
    }

    /// Request auth facade, or a configuration error if the auth middleware
    /// did not run
    pub fn auth(&self) -> Result<&Arc<AuthContext>> {
        self.auth
            .as_ref()
            .ok_or_else(|| Error::config("No auth context attached; is the auth middleware installed?"))
    }
}
