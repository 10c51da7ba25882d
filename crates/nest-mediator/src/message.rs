use std::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
};

use serde::Serialize;
use uuid::Uuid;

use crate::{error::MediatorError, request::Request};

/// Stable identifier of a Rust type, used as the routing key of the
/// request map, the event map and the container.
#[derive(Clone, Copy)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
}

impl TypeToken {
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_name(std::any::type_name::<T>()),
        }
    }

    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Unqualified type name: `scada_api::service::events::Foo` becomes `Foo`.
    /// Generic parameters are dropped.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

fn short_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeToken({})", self.name)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A value that can travel through the mediator type-erased.
///
/// Implemented for every `Serialize + Debug` type that is `Send + Sync`.
pub trait Message: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;

    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;

    fn token(&self) -> TypeToken;
}

impl<T> Message for T
where
    T: Any + Send + Sync + fmt::Debug + Serialize,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }

    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn token(&self) -> TypeToken {
        TypeToken::of::<T>()
    }
}

impl dyn Message {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// JSON rendering for logs. Falls back to `Debug` when the value does not
    /// serialize.
    pub fn render(&self) -> String {
        match self.to_json() {
            Ok(value) => value.to_string(),
            Err(_) => format!("{self:?}"),
        }
    }
}

/// An erased request on its way to the handler.
///
/// Middleware can inspect the request with [`RequestEnvelope::downcast_ref`]
/// or swap it with [`RequestEnvelope::replace`].
#[derive(Debug)]
pub struct RequestEnvelope {
    request_id: Uuid,
    token: TypeToken,
    body: Box<dyn Message>,
}

impl RequestEnvelope {
    pub fn new<R: Request>(request: R) -> Self {
        Self {
            request_id: request.request_id(),
            token: TypeToken::of::<R>(),
            body: Box::new(request),
        }
    }

    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    #[must_use]
    pub fn token(&self) -> TypeToken {
        self.token
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.token.name()
    }

    #[must_use]
    pub fn body(&self) -> &dyn Message {
        self.body.as_ref()
    }

    pub fn downcast_ref<R: Request>(&self) -> Option<&R> {
        self.body().downcast_ref::<R>()
    }

    /// Replaces the carried request. The new request may be of another type,
    /// in which case it is routed by the handler bound to the original type
    /// and fails there with [`MediatorError::RequestTypeMismatch`].
    pub fn replace<R: Request>(&mut self, request: R) {
        self.request_id = request.request_id();
        self.body = Box::new(request);
    }

    pub fn into_request<R: Request>(self) -> Result<R, MediatorError> {
        let found = self.body().token();
        self.body
            .into_any()
            .downcast::<R>()
            .map(|request| *request)
            .map_err(|_| MediatorError::RequestTypeMismatch {
                expected: TypeToken::of::<R>().name(),
                found: found.name(),
            })
    }
}

/// An erased handler response. Void requests answer with `()`.
#[derive(Debug)]
pub struct ResponseEnvelope {
    token: TypeToken,
    body: Box<dyn Message>,
}

impl ResponseEnvelope {
    pub fn new<T: Message>(response: T) -> Self {
        Self {
            token: TypeToken::of::<T>(),
            body: Box::new(response),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(())
    }

    #[must_use]
    pub fn token(&self) -> TypeToken {
        self.token
    }

    #[must_use]
    pub fn body(&self) -> &dyn Message {
        self.body.as_ref()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.body().downcast_ref::<T>()
    }

    pub fn to_json(&self) -> Result<serde_json::Value, MediatorError> {
        self.body()
            .to_json()
            .map_err(|source| MediatorError::Serialization {
                type_name: self.token.name(),
                source,
            })
    }

    pub fn into_inner<T: Any>(self) -> Result<T, MediatorError> {
        let found = self.token;
        self.body
            .into_any()
            .downcast::<T>()
            .map(|response| *response)
            .map_err(|_| MediatorError::ResponseTypeMismatch {
                expected: TypeToken::of::<T>().name(),
                found: found.name(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod nested {
        #[derive(Debug, serde::Serialize)]
        pub struct Gauge {
            pub value: u32,
        }
    }

    #[test]
    fn test_token_name_strips_module_path() {
        assert_eq!(TypeToken::of::<nested::Gauge>().name(), "Gauge");
        assert_eq!(TypeToken::of::<Vec<u8>>().name(), "Vec");
    }

    #[test]
    fn test_tokens_compare_by_type() {
        assert_eq!(TypeToken::of::<nested::Gauge>(), TypeToken::of::<nested::Gauge>());
        assert_ne!(TypeToken::of::<nested::Gauge>(), TypeToken::of::<u32>());
    }

    #[test]
    fn test_response_envelope_downcasts_to_stored_type() {
        let envelope = ResponseEnvelope::new(nested::Gauge { value: 7 });
        assert_eq!(envelope.downcast_ref::<nested::Gauge>().map(|p| p.value), Some(7));

        let gauge = envelope.into_inner::<nested::Gauge>().unwrap();
        assert_eq!(gauge.value, 7);
    }

    #[test]
    fn test_response_envelope_reports_mismatch() {
        let envelope = ResponseEnvelope::new(nested::Gauge { value: 7 });
        let err = envelope.into_inner::<String>().unwrap_err();
        assert!(matches!(
            err,
            MediatorError::ResponseTypeMismatch {
                expected: "String",
                found: "Gauge"
            }
        ));
    }

    #[test]
    fn test_render_uses_json() {
        let gauge: Box<dyn Message> = Box::new(nested::Gauge { value: 3 });
        assert_eq!(gauge.render(), r#"{"value":3}"#);
    }
}
