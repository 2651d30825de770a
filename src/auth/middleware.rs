use crate::auth::manager::AuthManager;
use crate::context::Context;
use crate::error::Result;
use crate::middleware::{InboundAction, InboundMiddleware};
use async_trait::async_trait;
use std::sync::Arc;

/// Binds an `AuthContext` to each request
///
/// Must run after the session middleware; a missing session is a wiring
/// mistake and fails the request rather than proceeding anonymously.
#[derive(Clone)]
pub struct AuthMiddleware {
    manager: Arc<AuthManager>,
}

impl AuthMiddleware {
    pub fn new(manager: Arc<AuthManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl InboundMiddleware for AuthMiddleware {
    async fn process_request(&self, ctx: &mut Context) -> Result<InboundAction> {
        let session = ctx.session_required()?.clone();
        ctx.set_auth(Arc::new(self.manager.create_context(session)));
        Ok(InboundAction::Continue)
    }

    fn name(&self) -> &'static str {
        "auth"
    }

    fn priority(&self) -> i32 {
        -400 // After session (-500), before application middleware
    }
}
