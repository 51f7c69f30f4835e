//! Provider error types

use rackflow_core::TemplateError;
use thiserror::Error;

/// Provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Stack resource not found: {resource} in stack {stack}")]
    StackResourceNotFound { stack: String, resource: String },

    #[error("no such key: {key}")]
    ObjectNotFound { app: String, key: String },

    #[error("App not found: {0}")]
    AppNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed identity: {0}")]
    MalformedIdentity(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Identity lookup failed: {0}")]
    IdentityLookup(#[source] Box<ProviderError>),

    #[error("Repository lookup failed: {0}")]
    RepositoryLookup(#[source] Box<ProviderError>),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification callers use to pick retry or messaging behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AppNotFound,
    InvalidInput,
    MalformedIdentity,
    TemplateNotFound,
    InvalidOutput,
    BackendUnavailable,
    Other,
}

impl ProviderError {
    /// Classify the error; step wrappers report the kind of their source
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::StackResourceNotFound { .. } | ProviderError::ObjectNotFound { .. } => {
                ErrorKind::NotFound
            }
            ProviderError::AppNotFound(_) => ErrorKind::AppNotFound,
            ProviderError::InvalidInput(_) => ErrorKind::InvalidInput,
            ProviderError::MalformedIdentity(_) => ErrorKind::MalformedIdentity,
            ProviderError::BackendUnavailable(_) | ProviderError::Io(_) => {
                ErrorKind::BackendUnavailable
            }
            ProviderError::IdentityLookup(inner) | ProviderError::RepositoryLookup(inner) => {
                inner.kind()
            }
            ProviderError::Template(TemplateError::NotFound { .. }) => ErrorKind::TemplateNotFound,
            ProviderError::Template(TemplateError::InvalidName(_)) => ErrorKind::InvalidInput,
            ProviderError::Template(TemplateError::InvalidOutput { .. }) => {
                ErrorKind::InvalidOutput
            }
            ProviderError::Template(_)
            | ProviderError::CommandFailed(_)
            | ProviderError::InvalidConfig(_)
            | ProviderError::Json(_) => ErrorKind::Other,
        }
    }

    /// Whether the failure is transient and the caller may retry
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::BackendUnavailable
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_errors_keep_kind() {
        let err = ProviderError::RepositoryLookup(Box::new(
            ProviderError::StackResourceNotFound {
                stack: "prod-web".to_string(),
                resource: "Repository".to_string(),
            },
        ));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().starts_with("Repository lookup failed"));

        let err = ProviderError::IdentityLookup(Box::new(ProviderError::BackendUnavailable(
            "throttled".to_string(),
        )));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_object_not_found_names_key() {
        let err = ProviderError::ObjectNotFound {
            app: "web".to_string(),
            key: "build.tgz".to_string(),
        };
        assert_eq!(err.to_string(), "no such key: build.tgz");
        assert!(!err.is_retryable());
    }
}
