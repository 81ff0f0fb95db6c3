// Errors returned by `CommentService` implementations.

use koe_core::protocol::CallFailure;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("failed to build HTTP client: {0}")]
    HttpClientBuild(String),

    #[error("{operation}: service unreachable: {message}")]
    Transport { operation: &'static str, message: String },

    #[error("{operation}: timed out")]
    Timeout { operation: &'static str },

    /// Non-2xx response. The body is kept verbatim; its schema is unspecified.
    #[error("{operation}: service returned status {status}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation}: unexpected response body: {message}")]
    Decode { operation: &'static str, message: String },
}

impl ServiceError {
    /// True for failures where the service could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            ServiceError::Transport { .. } | ServiceError::Timeout { .. }
        )
    }

    /// Short text for the status bar.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::HttpClientBuild(_) => "HTTP client unavailable".to_string(),
            ServiceError::Transport { operation, .. } => {
                format!("{operation} failed: service unreachable")
            }
            ServiceError::Timeout { operation } => format!("{operation} failed: timed out"),
            ServiceError::Status {
                operation, status, ..
            } => format!("{operation} failed: status {status}"),
            ServiceError::Decode { operation, .. } => {
                format!("{operation} failed: unexpected response")
            }
        }
    }
}

impl From<&ServiceError> for CallFailure {
    fn from(err: &ServiceError) -> Self {
        CallFailure {
            message: err.user_message(),
            unreachable: err.is_unreachable(),
        }
    }
}
