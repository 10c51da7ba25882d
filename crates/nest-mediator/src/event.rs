use std::{any::Any, collections::HashMap, fmt, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::message::{Message, TypeToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Domain,
    Notification,
    Ecst,
}

impl EventKind {
    /// The `message_type` used on the broker.
    #[must_use]
    pub fn message_type(&self) -> &'static str {
        match self {
            EventKind::Domain => "domain_event",
            EventKind::Notification => "notification_event",
            EventKind::Ecst => "ecst_event",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message_type())
    }
}

/// Identity shared by every event variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventHeader {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub name: &'static str,
}

impl EventHeader {
    fn of<E: Message>() -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            name: TypeToken::of::<E>().name(),
        }
    }
}

/// Dispatched in-process to the handlers bound in the [`EventMap`].
#[derive(Debug, Clone)]
pub struct DomainEvent {
    header: EventHeader,
    payload: Arc<dyn Message>,
}

impl DomainEvent {
    pub fn new<E: Message>(payload: E) -> Self {
        Self {
            header: EventHeader::of::<E>(),
            payload: Arc::new(payload),
        }
    }

    #[must_use]
    pub fn header(&self) -> &EventHeader {
        &self.header
    }

    #[must_use]
    pub fn token(&self) -> TypeToken {
        self.payload().token()
    }

    #[must_use]
    pub fn payload(&self) -> &dyn Message {
        self.payload.as_ref()
    }

    pub fn downcast_ref<E: Any>(&self) -> Option<&E> {
        self.payload().downcast_ref::<E>()
    }
}

/// Identity and timestamp of a state change, published to the message broker.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    header: EventHeader,
    payload: Arc<dyn Message>,
}

impl NotificationEvent {
    pub fn new<E: Message>(payload: E) -> Self {
        Self {
            header: EventHeader::of::<E>(),
            payload: Arc::new(payload),
        }
    }

    #[must_use]
    pub fn header(&self) -> &EventHeader {
        &self.header
    }

    #[must_use]
    pub fn payload(&self) -> &dyn Message {
        self.payload.as_ref()
    }
}

/// Event-carried state transfer: the full new state, published to the
/// message broker.
#[derive(Debug, Clone)]
pub struct EcstEvent {
    header: EventHeader,
    payload: Arc<dyn Message>,
}

impl EcstEvent {
    pub fn new<E: Message>(payload: E) -> Self {
        Self {
            header: EventHeader::of::<E>(),
            payload: Arc::new(payload),
        }
    }

    #[must_use]
    pub fn header(&self) -> &EventHeader {
        &self.header
    }

    #[must_use]
    pub fn payload(&self) -> &dyn Message {
        self.payload.as_ref()
    }
}

/// Side effect produced while handling a request.
#[derive(Debug, Clone)]
pub enum Event {
    Domain(DomainEvent),
    Notification(NotificationEvent),
    Ecst(EcstEvent),
}

impl Event {
    pub fn domain<E: Message>(payload: E) -> Self {
        Event::Domain(DomainEvent::new(payload))
    }

    pub fn notification<E: Message>(payload: E) -> Self {
        Event::Notification(NotificationEvent::new(payload))
    }

    pub fn ecst<E: Message>(payload: E) -> Self {
        Event::Ecst(EcstEvent::new(payload))
    }

    #[must_use]
    pub fn header(&self) -> &EventHeader {
        match self {
            Event::Domain(event) => event.header(),
            Event::Notification(event) => event.header(),
            Event::Ecst(event) => event.header(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Domain(_) => EventKind::Domain,
            Event::Notification(_) => EventKind::Notification,
            Event::Ecst(_) => EventKind::Ecst,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.header().name
    }
}

/// In-process subscriber of one domain event type.
#[async_trait]
pub trait EventHandler<E: Message>: Send + Sync + 'static {
    async fn handle(&self, event: &E, header: &EventHeader) -> anyhow::Result<()>;
}

#[async_trait]
pub(crate) trait ErasedEventHandler: Send + Sync {
    async fn call(&self, event: &DomainEvent) -> anyhow::Result<()>;
}

struct Erased<E, H> {
    handler: H,
    _event: PhantomData<fn(E)>,
}

#[async_trait]
impl<E, H> ErasedEventHandler for Erased<E, H>
where
    E: Message,
    H: EventHandler<E>,
{
    async fn call(&self, event: &DomainEvent) -> anyhow::Result<()> {
        let payload = event.downcast_ref::<E>().ok_or_else(|| {
            anyhow::anyhow!(
                "event {} routed to a handler of {}",
                event.header().name,
                TypeToken::of::<E>()
            )
        })?;
        self.handler.handle(payload, event.header()).await
    }
}

fn erase<E, H>(instance: Box<dyn Any + Send>) -> Option<Box<dyn ErasedEventHandler>>
where
    E: Message,
    H: EventHandler<E>,
{
    let handler = instance.downcast::<H>().ok()?;
    Some(Box::new(Erased::<E, H> {
        handler: *handler,
        _event: PhantomData,
    }))
}

#[derive(Clone, Copy)]
pub struct EventHandlerBinding {
    handler: TypeToken,
    erase: fn(Box<dyn Any + Send>) -> Option<Box<dyn ErasedEventHandler>>,
}

impl EventHandlerBinding {
    fn new<E: Message, H: EventHandler<E>>() -> Self {
        Self {
            handler: TypeToken::of::<H>(),
            erase: erase::<E, H>,
        }
    }

    #[must_use]
    pub fn handler(&self) -> TypeToken {
        self.handler
    }

    pub(crate) fn erase(
        &self,
        instance: Box<dyn Any + Send>,
    ) -> Option<Box<dyn ErasedEventHandler>> {
        (self.erase)(instance)
    }
}

impl fmt::Debug for EventHandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlerBinding")
            .field("handler", &self.handler)
            .finish()
    }
}

/// Domain event type to handler types. Binding appends, handlers run in
/// binding order.
#[derive(Debug, Default, Clone)]
pub struct EventMap {
    bindings: HashMap<TypeToken, Vec<EventHandlerBinding>>,
}

impl EventMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind<E, H>(&mut self)
    where
        E: Message,
        H: EventHandler<E>,
    {
        self.bindings
            .entry(TypeToken::of::<E>())
            .or_default()
            .push(EventHandlerBinding::new::<E, H>());
    }

    #[must_use]
    pub fn with<E, H>(mut self) -> Self
    where
        E: Message,
        H: EventHandler<E>,
    {
        self.bind::<E, H>();
        self
    }

    /// Unbound events yield an empty slice.
    #[must_use]
    pub fn get(&self, event: &TypeToken) -> &[EventHandlerBinding] {
        self.bindings
            .get(event)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn events(&self) -> impl Iterator<Item = TypeToken> + '_ {
        self.bindings.keys().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize)]
    struct NestRenamed {
        nest: u64,
    }

    struct AuditHandler;
    struct CacheHandler;

    #[async_trait]
    impl EventHandler<NestRenamed> for AuditHandler {
        async fn handle(&self, _event: &NestRenamed, _header: &EventHeader) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl EventHandler<NestRenamed> for CacheHandler {
        async fn handle(&self, _event: &NestRenamed, _header: &EventHeader) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unbound_event_has_no_handlers() {
        let map = EventMap::new();
        assert!(map.get(&TypeToken::of::<NestRenamed>()).is_empty());
    }

    #[test]
    fn test_binding_appends_in_order() {
        let map = EventMap::new()
            .with::<NestRenamed, AuditHandler>()
            .with::<NestRenamed, CacheHandler>()
            .with::<NestRenamed, AuditHandler>();

        let handlers: Vec<_> = map
            .get(&TypeToken::of::<NestRenamed>())
            .iter()
            .map(EventHandlerBinding::handler)
            .collect();

        assert_eq!(
            handlers,
            vec![
                TypeToken::of::<AuditHandler>(),
                TypeToken::of::<CacheHandler>(),
                TypeToken::of::<AuditHandler>(),
            ]
        );
    }

    #[test]
    fn test_event_envelope() {
        let event = Event::notification(NestRenamed { nest: 4 });
        assert_eq!(event.kind(), EventKind::Notification);
        assert_eq!(event.name(), "NestRenamed");

        let other = Event::ecst(NestRenamed { nest: 4 });
        assert_ne!(event.header().id, other.header().id);
        assert_eq!(other.kind().message_type(), "ecst_event");
    }

    #[test]
    fn test_domain_event_keeps_typed_payload() {
        let event = DomainEvent::new(NestRenamed { nest: 9 });
        assert_eq!(event.token(), TypeToken::of::<NestRenamed>());
        assert_eq!(event.downcast_ref::<NestRenamed>().map(|e| e.nest), Some(9));
    }
}
