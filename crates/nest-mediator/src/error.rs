use crate::{container::ResolveError, event::EventKind};

#[derive(Debug, thiserror::Error)]
pub enum MediatorError {
    #[error("handler for request {request} not found")]
    HandlerNotFound { request: &'static str },

    #[error(transparent)]
    Resolution(#[from] ResolveError),

    /// The handler's own error, untouched.
    #[error(transparent)]
    Handler(anyhow::Error),

    #[error("event handler {handler} failed on {event}")]
    EventHandlerFailed {
        event: &'static str,
        handler: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("{event} is a {kind} and needs a message broker, none is configured")]
    BrokerNotConfigured {
        event: &'static str,
        kind: EventKind,
    },

    #[error("message broker failed to send {event}")]
    Broker {
        event: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to serialize {type_name}")]
    Serialization {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected request {expected}, got {found}")]
    RequestTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("expected response {expected}, got {found}")]
    ResponseTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl MediatorError {
    /// Downcasts an error raised by a request or event handler.
    pub fn domain_error<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            MediatorError::Handler(source) | MediatorError::EventHandlerFailed { source, .. } => {
                source.downcast_ref::<E>()
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn is_handler_not_found(&self) -> bool {
        matches!(self, MediatorError::HandlerNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("holder 3 not found")]
    struct NotFound;

    #[test]
    fn test_handler_error_keeps_its_message() {
        let err = MediatorError::Handler(NotFound.into());
        assert_eq!(err.to_string(), "holder 3 not found");
        assert!(err.domain_error::<NotFound>().is_some());
    }

    #[test]
    fn test_domain_error_ignores_core_failures() {
        let err = MediatorError::HandlerNotFound { request: "Ping" };
        assert!(err.domain_error::<NotFound>().is_none());
        assert!(err.is_handler_not_found());
        assert_eq!(err.to_string(), "handler for request Ping not found");
    }
}
