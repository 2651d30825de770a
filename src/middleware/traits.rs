use crate::context::Context;
use crate::error::Result;
use async_trait::async_trait;

/// Action to take after processing an inbound middleware
#[derive(Debug, Clone)]
pub enum InboundAction {
    /// Continue to the next middleware in the chain
    Continue,

    /// Stop the chain and use the response set on the context
    Stop,

    /// Continue processing and ensure this middleware processes the response
    Capture,
}

/// Middleware that processes incoming requests
///
/// Runs before the handler; can modify the context, short-circuit with an
/// early response, or register for outbound processing.
#[async_trait]
pub trait InboundMiddleware: Send + Sync + 'static {
    async fn process_request(&self, ctx: &mut Context) -> Result<InboundAction>;

    fn name(&self) -> &'static str {
        "unnamed"
    }

    /// Execution priority; lower numbers run first
    fn priority(&self) -> i32 {
        0
    }
}

/// Middleware that processes outgoing responses
///
/// Runs after the handler, in reverse order of inbound processing. For
/// middleware that returned `Capture`, the chain guarantees this phase runs
/// even when the handler failed — session persistence relies on that.
#[async_trait]
pub trait OutboundMiddleware: Send + Sync + 'static {
    async fn process_response(&self, ctx: &mut Context) -> Result<()>;
}

/// Container for a middleware instance with phase information
pub struct MiddlewareInstance {
    pub name: String,
    pub priority: i32,
    pub inbound: Option<Box<dyn InboundMiddleware>>,
    pub outbound: Option<Box<dyn OutboundMiddleware>>,
}

impl MiddlewareInstance {
    /// Create an inbound-only middleware instance
    pub fn inbound<M: InboundMiddleware>(name: &str, middleware: M) -> Self {
        let priority = middleware.priority();
        Self {
            name: name.to_string(),
            priority,
            inbound: Some(Box::new(middleware)),
            outbound: None,
        }
    }

    /// Create an outbound-only middleware instance
    pub fn outbound<M: OutboundMiddleware>(name: &str, middleware: M) -> Self {
        Self {
            name: name.to_string(),
            priority: 0,
            inbound: None,
            outbound: Some(Box::new(middleware)),
        }
    }

    /// Create a dual-phase middleware instance
    pub fn dual<M>(name: &str, middleware: M) -> Self
    where
        M: InboundMiddleware + OutboundMiddleware + Clone + 'static,
    {
        let priority = middleware.priority();
        Self {
            name: name.to_string(),
            priority,
            inbound: Some(Box::new(middleware.clone())),
            outbound: Some(Box::new(middleware)),
        }
    }
}
