use std::sync::Arc;

use tracing::{Instrument, debug, debug_span};

use crate::{
    container::{Container, ResolveError},
    error::MediatorError,
    event::Event,
    message::{RequestEnvelope, ResponseEnvelope},
    middleware::MiddlewareChain,
    request::{Request, RequestMap},
};

/// Outcome of one dispatch: the handler response and the events it recorded,
/// in production order.
#[derive(Debug)]
pub struct DispatchResult {
    pub response: ResponseEnvelope,
    pub events: Vec<Event>,
}

/// Routes a request to its bound handler.
///
/// Errors from resolution and from the handler are returned as they are; no
/// translation happens here.
#[derive(Debug)]
pub struct Dispatcher {
    request_map: RequestMap,
    container: Arc<Container>,
    middleware: MiddlewareChain,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        request_map: RequestMap,
        container: Arc<Container>,
        middleware: MiddlewareChain,
    ) -> Self {
        Self {
            request_map,
            container,
            middleware,
        }
    }

    #[must_use]
    pub fn request_map(&self) -> &RequestMap {
        &self.request_map
    }

    pub async fn dispatch(&self, request: RequestEnvelope) -> Result<DispatchResult, MediatorError> {
        let token = request.token();
        let binding = *self
            .request_map
            .get(&token)
            .ok_or(MediatorError::HandlerNotFound {
                request: token.name(),
            })?;

        let scope = self.container.scope();
        let span = debug_span!(
            "dispatch",
            request = token.name(),
            request_id = %request.request_id(),
            scope_id = %scope.id(),
        );

        async move {
            let handler_token = binding.handler();
            let instance = scope.resolve_token(&handler_token).await?;
            let mut handler = binding.erase(instance).ok_or(ResolveError::TypeMismatch {
                token: handler_token.name(),
            })?;

            debug!(handler = handler_token.name(), "handler resolved");
            let response = self.middleware.wrap(&mut *handler).run(request).await?;
            let events = handler.take_events();
            debug!(events = events.len(), "request dispatched");

            Ok::<_, MediatorError>(DispatchResult { response, events })
        }
        .instrument(span)
        .await
    }

    pub async fn dispatch_request<R: Request>(
        &self,
        request: R,
    ) -> Result<DispatchResult, MediatorError> {
        self.dispatch(RequestEnvelope::new(request)).await
    }
}
