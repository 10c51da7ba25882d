/// Business failures raised by handlers and repositories.
///
/// They travel through the mediator untouched inside
/// `MediatorError::Handler` and are mapped to reply kinds by the adapter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    AlreadyExists { message: String, path: Vec<String> },

    #[error("{0}")]
    Validation(String),
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
