use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::{
    error::MediatorError,
    message::{RequestEnvelope, ResponseEnvelope},
    request::ErasedHandler,
};

/// Cross-cutting step wrapped around every handler invocation.
///
/// Call `next.run(request)` to continue the chain, or return without calling
/// it to short-circuit.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn invoke(
        &self,
        request: RequestEnvelope,
        next: Next<'_>,
    ) -> Result<ResponseEnvelope, MediatorError>;
}

/// The rest of the chain, ending in the handler.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    endpoint: &'a mut dyn ErasedHandler,
}

impl Next<'_> {
    pub async fn run(self, request: RequestEnvelope) -> Result<ResponseEnvelope, MediatorError> {
        match self.chain.split_first() {
            Some((middleware, rest)) => {
                let next = Next {
                    chain: rest,
                    endpoint: self.endpoint,
                };
                middleware.invoke(request, next).await
            }
            None => self.endpoint.call(request).await,
        }
    }
}

/// Ordered middleware. The first one added is the outermost: it sees the
/// request first and the response last.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, middleware: impl Middleware) {
        self.middlewares.push(Arc::new(middleware));
    }

    #[must_use]
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.add(middleware);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub(crate) fn wrap<'a>(&'a self, endpoint: &'a mut dyn ErasedHandler) -> Next<'a> {
        Next {
            chain: &self.middlewares,
            endpoint,
        }
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("len", &self.middlewares.len())
            .finish()
    }
}

#[non_exhaustive]
#[derive(Debug, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn invoke(
        &self,
        request: RequestEnvelope,
        next: Next<'_>,
    ) -> Result<ResponseEnvelope, MediatorError> {
        let name = request.name();
        let request_id = request.request_id();
        debug!(%request_id, request = %request.body().render(), "Handle {name} request");

        let res = next.run(request).await;
        match &res {
            Ok(response) => {
                debug!(%request_id, response = %response.body().render(), "Request {name} handled");
            }
            Err(e) => error!(%request_id, "Request {name} failed: {e}"),
        }

        res
    }
}
