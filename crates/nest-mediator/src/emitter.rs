use std::sync::Arc;

use tracing::{Instrument, debug, debug_span};

use crate::{
    broker::{BrokerMessage, MessageBroker},
    container::{Container, ResolveError},
    error::MediatorError,
    event::{DomainEvent, Event, EventHeader, EventKind, EventMap},
    message::Message,
};

/// Delivers events: domain events to the handlers bound in the event map,
/// notification and ECST events to the message broker.
pub struct EventEmitter {
    event_map: EventMap,
    container: Arc<Container>,
    broker: Option<Arc<dyn MessageBroker>>,
}

impl EventEmitter {
    #[must_use]
    pub fn new(event_map: EventMap, container: Arc<Container>) -> Self {
        Self {
            event_map,
            container,
            broker: None,
        }
    }

    #[must_use]
    pub fn with_broker(mut self, broker: Arc<dyn MessageBroker>) -> Self {
        self.broker = Some(broker);
        self
    }

    #[must_use]
    pub fn has_broker(&self) -> bool {
        self.broker.is_some()
    }

    #[must_use]
    pub fn event_map(&self) -> &EventMap {
        &self.event_map
    }

    pub async fn emit(&self, event: &Event) -> Result<(), MediatorError> {
        let header = event.header();
        let span = debug_span!("emit", event = header.name, event_id = %header.id);

        match event {
            Event::Domain(event) => self.handle_domain(event).instrument(span).await,
            Event::Notification(event) => {
                self.publish(EventKind::Notification, event.header(), event.payload())
                    .instrument(span)
                    .await
            }
            Event::Ecst(event) => {
                self.publish(EventKind::Ecst, event.header(), event.payload())
                    .instrument(span)
                    .await
            }
        }
    }

    /// Handlers run one after another in binding order. The first failure
    /// stops the remaining handlers of this event.
    async fn handle_domain(&self, event: &DomainEvent) -> Result<(), MediatorError> {
        let name = event.header().name;
        let bindings = self.event_map.get(&event.token());
        if bindings.is_empty() {
            debug!("Handler for {name} not found");
            return Ok(());
        }

        for binding in bindings {
            let handler_token = binding.handler();
            let scope = self.container.scope();
            let instance = scope.resolve_token(&handler_token).await?;
            let handler = binding
                .erase(instance)
                .ok_or(ResolveError::TypeMismatch {
                    token: handler_token.name(),
                })?;

            debug!("Handling Event({name}) via event handler({handler_token})");
            handler
                .call(event)
                .await
                .map_err(|source| MediatorError::EventHandlerFailed {
                    event: name,
                    handler: handler_token.name(),
                    source,
                })?;
        }

        Ok(())
    }

    async fn publish(
        &self,
        kind: EventKind,
        header: &EventHeader,
        payload: &dyn Message,
    ) -> Result<(), MediatorError> {
        let Some(broker) = &self.broker else {
            return Err(MediatorError::BrokerNotConfigured {
                event: header.name,
                kind,
            });
        };

        let message = BrokerMessage::from_event(kind, header, payload)?;
        debug!("Sending {kind} {} to message broker", header.id);

        broker
            .send_message(message)
            .await
            .map_err(|source| MediatorError::Broker {
                event: header.name,
                source,
            })
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("event_map", &self.event_map)
            .field("broker", &self.broker.is_some())
            .finish()
    }
}
