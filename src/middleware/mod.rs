//! Dual-phase middleware chain
//!
//! Separates request processing (inbound) from response processing
//! (outbound). Outbound phases run in reverse registration order, and for
//! middleware that captured the request they run even when the handler
//! returned an error — this is what makes session persistence a guaranteed
//! cleanup action rather than best effort.

pub mod traits;

pub use traits::{InboundAction, InboundMiddleware, MiddlewareInstance, OutboundMiddleware};

use crate::context::Context;
use crate::error::Result;
use std::future::Future;
use std::pin::Pin;

/// Boxed handler future, borrowing the request context
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Ordered collection of middleware, executed around a handler
#[derive(Default)]
pub struct MiddlewareChain {
    middleware: Vec<MiddlewareInstance>,
    sorted: bool,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middleware: Vec::new(),
            sorted: true,
        }
    }

    /// Register an inbound-only middleware
    pub fn register_inbound<M: InboundMiddleware>(&mut self, name: &str, middleware: M) {
        self.middleware
            .push(MiddlewareInstance::inbound(name, middleware));
        self.sorted = false;
    }

    /// Register an outbound-only middleware
    pub fn register_outbound<M: OutboundMiddleware>(&mut self, name: &str, middleware: M) {
        self.middleware
            .push(MiddlewareInstance::outbound(name, middleware));
        self.sorted = false;
    }

    /// Register a dual-phase middleware
    pub fn register_dual<M>(&mut self, name: &str, middleware: M)
    where
        M: InboundMiddleware + OutboundMiddleware + Clone + 'static,
    {
        self.middleware
            .push(MiddlewareInstance::dual(name, middleware));
        self.sorted = false;
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    fn sort(&mut self) {
        if !self.sorted {
            self.middleware.sort_by_key(|m| m.priority);
            self.sorted = true;
        }
    }

    /// Run the chain around a handler
    ///
    /// Inbound phases run in priority order; the handler runs unless an
    /// inbound middleware stopped the chain; outbound phases then run in
    /// reverse order for every middleware that captured (or is
    /// outbound-only). A handler error is returned to the caller, but only
    /// after the outbound phases have executed.
    pub async fn run<F>(&mut self, ctx: &mut Context, handler: F) -> Result<()>
    where
        F: for<'a> FnOnce(&'a mut Context) -> HandlerFuture<'a>,
    {
        self.sort();

        let mut captured: Vec<usize> = Vec::new();
        let mut stopped = false;

        for (index, instance) in self.middleware.iter().enumerate() {
            match &instance.inbound {
                Some(inbound) => match inbound.process_request(ctx).await? {
                    InboundAction::Continue => {}
                    InboundAction::Capture => captured.push(index),
                    InboundAction::Stop => {
                        stopped = true;
                        break;
                    }
                },
                // Outbound-only middleware always get the response phase
                None => captured.push(index),
            }
        }

        let handler_result = if stopped { Ok(()) } else { handler(ctx).await };

        if handler_result.is_err() && ctx.res.is_none() {
            ctx.res = Some(crate::http::Response::internal_error());
        }

        let mut outbound_error: Option<crate::error::Error> = None;
        for index in captured.iter().rev() {
            if let Some(outbound) = &self.middleware[*index].outbound {
                if let Err(e) = outbound.process_response(ctx).await {
                    log::error!(
                        "Outbound middleware '{}' failed: {}",
                        self.middleware[*index].name,
                        e
                    );
                    if outbound_error.is_none() {
                        outbound_error = Some(e);
                    }
                }
            }
        }

        match (handler_result, outbound_error) {
            (Err(e), _) => Err(e),
            (Ok(()), Some(e)) => Err(e),
            (Ok(()), None) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::http::{Request, Response};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct CountingMiddleware {
        outbound_calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl InboundMiddleware for CountingMiddleware {
        async fn process_request(&self, _ctx: &mut Context) -> Result<InboundAction> {
            Ok(InboundAction::Capture)
        }
    }

    #[async_trait]
    impl OutboundMiddleware for CountingMiddleware {
        async fn process_response(&self, _ctx: &mut Context) -> Result<()> {
            self.outbound_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_outbound_runs_when_handler_fails() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut chain = MiddlewareChain::new();
        chain.register_dual(
            "counter",
            CountingMiddleware {
                outbound_calls: Arc::clone(&calls),
            },
        );

        let mut ctx = Context::new(Request::new("GET", "/boom"));
        let result = chain
            .run(&mut ctx, |_ctx| {
                Box::pin(async { Err(Error::internal("handler exploded")) })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(ctx.res.is_some());
    }

    #[tokio::test]
    async fn test_handler_runs_and_outbound_follows() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut chain = MiddlewareChain::new();
        chain.register_dual(
            "counter",
            CountingMiddleware {
                outbound_calls: Arc::clone(&calls),
            },
        );

        let mut ctx = Context::new(Request::new("GET", "/"));
        chain
            .run(&mut ctx, |ctx| {
                Box::pin(async move {
                    ctx.res = Some(Response::ok());
                    Ok(())
                })
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.res.as_ref().unwrap().status, hyper::StatusCode::OK);
    }
}
