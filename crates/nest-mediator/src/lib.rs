//! Mediator core: routes requests to their handlers through a middleware
//! chain and delivers the events those handlers produce, either to
//! in-process event handlers or to a message broker.

pub mod broker;
pub mod container;
pub mod dispatcher;
pub mod emitter;
pub mod error;
pub mod event;
pub mod message;
pub mod middleware;
pub mod request;

mod mediator;

pub use broker::{BroadcastBroker, BrokerMessage, MessageBroker};
pub use container::{Container, ResolveError, Scope};
pub use dispatcher::{DispatchResult, Dispatcher};
pub use emitter::EventEmitter;
pub use error::MediatorError;
pub use event::{
    DomainEvent, EcstEvent, Event, EventHandler, EventHeader, EventKind, EventMap,
    NotificationEvent,
};
pub use mediator::{DrainOrder, Mediator, MediatorBuilder};
pub use message::{Message, RequestEnvelope, ResponseEnvelope, TypeToken};
pub use middleware::{LoggingMiddleware, Middleware, MiddlewareChain, Next};
pub use request::{Command, Query, Request, RequestHandler, RequestId, RequestMap};
