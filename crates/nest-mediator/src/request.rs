use std::{any::Any, collections::HashMap, fmt, marker::PhantomData};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::MediatorError,
    event::Event,
    message::{Message, RequestEnvelope, ResponseEnvelope, TypeToken},
};

/// A unit of work submitted to the mediator.
pub trait Request: Message {
    type Response: Message;

    fn request_id(&self) -> Uuid;
}

/// A request with mutating intent. Routed exactly like any other request.
pub trait Command: Request {}

/// A request with read intent. Routed exactly like any other request.
pub trait Query: Request {}

/// Identifier assigned to every request when it is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Business logic bound to exactly one request type.
///
/// A fresh instance is resolved for every dispatch, so `&mut self` state never
/// outlives one request.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + 'static {
    async fn handle(&mut self, request: R) -> anyhow::Result<R::Response>;

    /// Drains the events recorded during [`RequestHandler::handle`], in the
    /// order they were produced.
    fn events(&mut self) -> Vec<Event> {
        Vec::new()
    }
}

#[async_trait]
pub(crate) trait ErasedHandler: Send {
    async fn call(&mut self, request: RequestEnvelope) -> Result<ResponseEnvelope, MediatorError>;

    fn take_events(&mut self) -> Vec<Event>;
}

struct Erased<R, H> {
    handler: H,
    _request: PhantomData<fn(R)>,
}

#[async_trait]
impl<R, H> ErasedHandler for Erased<R, H>
where
    R: Request,
    H: RequestHandler<R>,
{
    async fn call(&mut self, request: RequestEnvelope) -> Result<ResponseEnvelope, MediatorError> {
        let request = request.into_request::<R>()?;
        let response = self
            .handler
            .handle(request)
            .await
            .map_err(MediatorError::Handler)?;
        Ok(ResponseEnvelope::new(response))
    }

    fn take_events(&mut self) -> Vec<Event> {
        self.handler.events()
    }
}

fn erase<R, H>(instance: Box<dyn Any + Send>) -> Option<Box<dyn ErasedHandler>>
where
    R: Request,
    H: RequestHandler<R>,
{
    let handler = instance.downcast::<H>().ok()?;
    Some(Box::new(Erased::<R, H> {
        handler: *handler,
        _request: PhantomData,
    }))
}

/// The handler type bound to one request type.
#[derive(Clone, Copy)]
pub struct HandlerBinding {
    handler: TypeToken,
    erase: fn(Box<dyn Any + Send>) -> Option<Box<dyn ErasedHandler>>,
}

impl HandlerBinding {
    fn new<R: Request, H: RequestHandler<R>>() -> Self {
        Self {
            handler: TypeToken::of::<H>(),
            erase: erase::<R, H>,
        }
    }

    #[must_use]
    pub fn handler(&self) -> TypeToken {
        self.handler
    }

    pub(crate) fn erase(&self, instance: Box<dyn Any + Send>) -> Option<Box<dyn ErasedHandler>> {
        (self.erase)(instance)
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("handler", &self.handler)
            .finish()
    }
}

/// Request type to handler type routing table.
///
/// Built once at startup and read-only afterwards. Binding a request type a
/// second time replaces the earlier handler: the last binding wins.
#[derive(Debug, Default, Clone)]
pub struct RequestMap {
    bindings: HashMap<TypeToken, HandlerBinding>,
}

impl RequestMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `R` to `H`, returning the handler it replaced, if any.
    pub fn bind<R, H>(&mut self) -> Option<TypeToken>
    where
        R: Request,
        H: RequestHandler<R>,
    {
        let request = TypeToken::of::<R>();
        let binding = HandlerBinding::new::<R, H>();
        let previous = self
            .bindings
            .insert(request, binding)
            .map(|old| old.handler);

        if let Some(previous) = previous {
            warn!(
                %request,
                %previous,
                handler = %binding.handler,
                "request rebound, the last binding wins"
            );
        }

        previous
    }

    #[must_use]
    pub fn with<R, H>(mut self) -> Self
    where
        R: Request,
        H: RequestHandler<R>,
    {
        self.bind::<R, H>();
        self
    }

    /// A miss is not an error at this layer.
    #[must_use]
    pub fn get(&self, request: &TypeToken) -> Option<&HandlerBinding> {
        self.bindings.get(request)
    }

    #[must_use]
    pub fn handler_for<R: Request>(&self) -> Option<TypeToken> {
        self.get(&TypeToken::of::<R>()).map(HandlerBinding::handler)
    }

    pub fn requests(&self) -> impl Iterator<Item = TypeToken> + '_ {
        self.bindings.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
