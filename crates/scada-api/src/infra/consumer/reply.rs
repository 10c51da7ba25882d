use nest_mediator::MediatorError;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{domain::DomainError, infra::consumer::registry::DecodeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Unprocessable,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReply {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
}

impl ErrorReply {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: Vec::new(),
        }
    }
}

impl From<&DomainError> for ErrorReply {
    fn from(err: &DomainError) -> Self {
        match err {
            DomainError::NotFound(message) => ErrorReply::new(ErrorKind::NotFound, message),
            DomainError::AlreadyExists { message, path } => ErrorReply {
                kind: ErrorKind::AlreadyExists,
                message: message.clone(),
                path: path.clone(),
            },
            DomainError::Validation(message) => ErrorReply::new(ErrorKind::Unprocessable, message),
        }
    }
}

impl From<&MediatorError> for ErrorReply {
    fn from(err: &MediatorError) -> Self {
        if let Some(domain) = err.domain_error::<DomainError>() {
            return domain.into();
        }

        match err {
            MediatorError::HandlerNotFound { .. } => {
                ErrorReply::new(ErrorKind::NotFound, err.to_string())
            }
            _ => ErrorReply::new(ErrorKind::Internal, format!("Unhandled error: {err}")),
        }
    }
}

impl From<&DecodeError> for ErrorReply {
    fn from(err: &DecodeError) -> Self {
        match err {
            DecodeError::UnknownRequest(_) => ErrorReply::new(ErrorKind::NotFound, err.to_string()),
            DecodeError::Malformed(_) => ErrorReply::new(ErrorKind::Unprocessable, err.to_string()),
            DecodeError::Invalid(domain) => domain.into(),
        }
    }
}

/// One line written back for every inbound request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReply>,
}

impl Reply {
    pub fn success(request_id: Uuid, response: Value) -> Self {
        Self {
            ok: true,
            request_id: Some(request_id),
            response: Some(response),
            error: None,
        }
    }

    pub fn failure(request_id: Option<Uuid>, error: ErrorReply) -> Self {
        Self {
            ok: false,
            request_id,
            response: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_already_exists_keeps_the_path() {
        let err = DomainError::AlreadyExists {
            message: "Entity already exists".into(),
            path: vec!["inn".into()],
        };

        let reply = serde_json::to_value(ErrorReply::from(&err)).unwrap();

        assert_eq!(
            reply,
            json!({"kind": "already_exists", "message": "Entity already exists", "path": ["inn"]})
        );
    }

    #[test]
    fn test_handler_domain_error_keeps_its_kind() {
        let err = MediatorError::Handler(DomainError::not_found("Nest with id 3 not found").into());

        let reply = ErrorReply::from(&err);

        assert_eq!(
            reply,
            ErrorReply::new(ErrorKind::NotFound, "Nest with id 3 not found")
        );
    }

    #[test]
    fn test_unbound_request_is_not_found() {
        let err = MediatorError::HandlerNotFound { request: "Ping" };
        assert_eq!(ErrorReply::from(&err).kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_other_failures_are_internal() {
        let err = MediatorError::Handler(anyhow::anyhow!("disk full"));

        let reply = ErrorReply::from(&err);

        assert_eq!(reply.kind, ErrorKind::Internal);
        assert_eq!(reply.message, "Unhandled error: disk full");
    }

    #[test]
    fn test_failure_reply_shape() {
        let reply = Reply::failure(None, ErrorReply::new(ErrorKind::Unprocessable, "bad"));

        assert_eq!(
            serde_json::to_value(reply).unwrap(),
            json!({"ok": false, "error": {"kind": "unprocessable", "message": "bad"}})
        );
    }
}
