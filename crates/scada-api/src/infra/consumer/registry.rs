use std::collections::HashMap;

use nest_mediator::{Request, RequestEnvelope, TypeToken};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::{domain::DomainError, service::validation::Validate};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown request type {0}")]
    UnknownRequest(String),

    #[error(transparent)]
    Invalid(#[from] DomainError),
}

type Decoder = fn(Value) -> Result<RequestEnvelope, DecodeError>;

fn decode<R>(body: Value) -> Result<RequestEnvelope, DecodeError>
where
    R: Request + DeserializeOwned + Validate,
{
    let request: R = serde_json::from_value(body)?;
    request.validate()?;
    Ok(RequestEnvelope::new(request))
}

/// Inbound name to request type table. A request is known under its bare
/// type name, e.g. `CreateHolder`.
#[derive(Debug, Default, Clone)]
pub struct RequestRegistry {
    decoders: HashMap<&'static str, Decoder>,
}

impl RequestRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R>(&mut self) -> &mut Self
    where
        R: Request + DeserializeOwned + Validate,
    {
        let name = TypeToken::of::<R>().name();
        if self.decoders.insert(name, decode::<R>).is_some() {
            warn!(request = name, "request name registered twice, the last one wins");
        }
        self
    }

    #[must_use]
    pub fn with<R>(mut self) -> Self
    where
        R: Request + DeserializeOwned + Validate,
    {
        self.register::<R>();
        self
    }

    pub fn decode(&self, name: &str, body: Value) -> Result<RequestEnvelope, DecodeError> {
        let decoder = self
            .decoders
            .get(name)
            .ok_or_else(|| DecodeError::UnknownRequest(name.to_owned()))?;
        decoder(body)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.decoders.len()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::service::{commands::CreateHolder, queries::GetHolder};

    fn registry() -> RequestRegistry {
        RequestRegistry::new()
            .with::<CreateHolder>()
            .with::<GetHolder>()
    }

    #[test]
    fn test_decodes_registered_request() {
        let envelope = registry()
            .decode("GetHolder", json!({"holder": 3}))
            .unwrap();

        assert_eq!(envelope.name(), "GetHolder");
        assert_eq!(envelope.downcast_ref::<GetHolder>().unwrap().holder, 3);
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = registry().decode("Ping", json!({})).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownRequest(name) if name == "Ping"));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = registry().decode("GetHolder", json!({})).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_invalid_request_is_rejected_before_dispatch() {
        let err = registry()
            .decode("CreateHolder", json!({"name": "Acme", "inn": "123"}))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Invalid(DomainError::Validation(_))));
    }

    mod renamed {
        use nest_mediator::RequestId;
        use serde::{Deserialize, Serialize};

        use crate::{domain::DomainError, service::validation::Validate};

        #[derive(Debug, Serialize, Deserialize)]
        pub struct GetHolder {
            #[serde(default)]
            pub request_id: RequestId,
        }

        impl nest_mediator::Request for GetHolder {
            type Response = ();

            fn request_id(&self) -> uuid::Uuid {
                self.request_id.as_uuid()
            }
        }

        impl Validate for GetHolder {
            fn validate(&self) -> Result<(), DomainError> {
                Ok(())
            }
        }
    }

    #[test]
    fn test_same_name_registered_twice_keeps_the_last_type() {
        let registry = registry().with::<renamed::GetHolder>();

        let envelope = registry.decode("GetHolder", json!({})).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(envelope.token(), TypeToken::of::<renamed::GetHolder>());
    }

    #[test]
    fn test_request_id_is_kept_when_given() {
        let id = uuid::Uuid::new_v4();
        let envelope = registry()
            .decode("GetHolder", json!({"request_id": id, "holder": 3}))
            .unwrap();
        assert_eq!(envelope.request_id(), id);
    }
}
