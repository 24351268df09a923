//! Error types for the todo API client.
//!
//! # Design
//! Two layers. `ApiError` is what a single request/response exchange can go
//! wrong with, and keeps the raw status and body for debugging. `TodoError` is
//! what the gateway hands to callers: one outcome per operation, phrased so
//! the presentation layer can show it directly.

use thiserror::Error;

use crate::types::TodoId;

/// Errors returned by `TodoClient` parse methods and by a `Transport`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The server returned 404. The requested resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// No response was received at all (connection refused, DNS, timeout).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 400 and 422 both mean the server rejected the payload itself.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self.status(), Some(400 | 422))
    }
}

/// Operation-level outcomes surfaced by the gateway and the view model.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TodoError {
    #[error("Failed to load todos. Please try again.")]
    ListUnavailable(#[source] ApiError),

    #[error("Failed to fetch todo {id}.")]
    Fetch {
        id: TodoId,
        #[source]
        source: ApiError,
    },

    #[error("Invalid todo data. Please check your input.")]
    InvalidInput(#[source] ApiError),

    #[error("Failed to create todo. Please try again.")]
    CreateFailed(#[source] ApiError),

    #[error("Todo {0} not found.")]
    NotFound(TodoId),

    #[error("Failed to update todo. Please try again.")]
    UpdateFailed(#[source] ApiError),

    #[error("Failed to delete todo. Please try again.")]
    DeleteFailed(#[source] ApiError),

    /// `save_edit` was called while nothing was being edited.
    #[error("no todo is being edited")]
    NoEditTarget,
}

/// Errors from reading or writing a `SessionStore`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Errors from login, registration, and session persistence.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("authentication request failed: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors from `Config::load`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reflects_variant() {
        assert_eq!(ApiError::NotFound.status(), Some(404));
        let err = ApiError::HttpError {
            status: 503,
            body: String::new(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(ApiError::Transport("refused".into()).status(), None);
    }

    #[test]
    fn validation_statuses_are_invalid_input() {
        for status in [400, 422] {
            let err = ApiError::HttpError {
                status,
                body: String::new(),
            };
            assert!(err.is_invalid_input());
        }
        assert!(!ApiError::NotFound.is_invalid_input());
    }

    #[test]
    fn todo_error_messages_name_the_operation() {
        let source = ApiError::Transport("refused".into());
        assert_eq!(
            TodoError::DeleteFailed(source.clone()).to_string(),
            "Failed to delete todo. Please try again."
        );
        assert_eq!(TodoError::NotFound(3).to_string(), "Todo 3 not found.");
        assert!(TodoError::ListUnavailable(source).to_string().contains("load todos"));
    }
}
