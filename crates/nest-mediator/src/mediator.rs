use std::sync::Arc;

use tracing::debug;

use crate::{
    broker::MessageBroker,
    container::Container,
    dispatcher::{DispatchResult, Dispatcher},
    emitter::EventEmitter,
    error::MediatorError,
    event::{Event, EventMap},
    message::{RequestEnvelope, ResponseEnvelope},
    middleware::{Middleware, MiddlewareChain},
    request::{Request, RequestMap},
};

/// Order in which the events recorded by a handler are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainOrder {
    /// The order the handler produced them in.
    #[default]
    Produced,
    /// Last produced first.
    Reversed,
}

/// Single entry point: dispatches a request, then emits the events its
/// handler produced, one at a time, before answering.
///
/// If emission fails the caller gets the error even though the handler
/// already succeeded.
#[derive(Clone)]
pub struct Mediator {
    inner: Arc<Inner>,
}

struct Inner {
    dispatcher: Dispatcher,
    emitter: EventEmitter,
    drain_order: DrainOrder,
}

impl Mediator {
    #[must_use]
    pub fn builder(request_map: RequestMap, container: Container) -> MediatorBuilder {
        MediatorBuilder::new(request_map, container)
    }

    pub async fn send<R: Request>(&self, request: R) -> Result<R::Response, MediatorError> {
        self.send_envelope(RequestEnvelope::new(request))
            .await?
            .into_inner::<R::Response>()
    }

    pub async fn send_envelope(
        &self,
        request: RequestEnvelope,
    ) -> Result<ResponseEnvelope, MediatorError> {
        let DispatchResult { response, events } = self.inner.dispatcher.dispatch(request).await?;
        self.drain(events).await?;
        Ok(response)
    }

    async fn drain(&self, mut events: Vec<Event>) -> Result<(), MediatorError> {
        if events.is_empty() {
            return Ok(());
        }
        if self.inner.drain_order == DrainOrder::Reversed {
            events.reverse();
        }

        debug!(count = events.len(), order = ?self.inner.drain_order, "draining events");
        for event in &events {
            self.inner.emitter.emit(event).await?;
        }
        Ok(())
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    #[must_use]
    pub fn emitter(&self) -> &EventEmitter {
        &self.inner.emitter
    }

    #[must_use]
    pub fn drain_order(&self) -> DrainOrder {
        self.inner.drain_order
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator")
            .field("dispatcher", &self.inner.dispatcher)
            .field("emitter", &self.inner.emitter)
            .field("drain_order", &self.inner.drain_order)
            .finish()
    }
}

#[must_use]
pub struct MediatorBuilder {
    request_map: RequestMap,
    container: Container,
    event_map: EventMap,
    broker: Option<Arc<dyn MessageBroker>>,
    middleware: MiddlewareChain,
    drain_order: DrainOrder,
}

impl MediatorBuilder {
    pub fn new(request_map: RequestMap, container: Container) -> Self {
        Self {
            request_map,
            container,
            event_map: EventMap::new(),
            broker: None,
            middleware: MiddlewareChain::new(),
            drain_order: DrainOrder::default(),
        }
    }

    pub fn event_map(mut self, event_map: EventMap) -> Self {
        self.event_map = event_map;
        self
    }

    pub fn broker(mut self, broker: Arc<dyn MessageBroker>) -> Self {
        self.broker = Some(broker);
        self
    }

    /// Appends one middleware; earlier ones wrap later ones.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.add(middleware);
        self
    }

    pub fn middleware_chain(mut self, chain: MiddlewareChain) -> Self {
        self.middleware = chain;
        self
    }

    pub fn drain_order(mut self, order: DrainOrder) -> Self {
        self.drain_order = order;
        self
    }

    pub fn build(self) -> Mediator {
        let container = Arc::new(self.container);
        let dispatcher = Dispatcher::new(self.request_map, Arc::clone(&container), self.middleware);
        let mut emitter = EventEmitter::new(self.event_map, container);
        if let Some(broker) = self.broker {
            emitter = emitter.with_broker(broker);
        }

        Mediator {
            inner: Arc::new(Inner {
                dispatcher,
                emitter,
                drain_order: self.drain_order,
            }),
        }
    }
}
