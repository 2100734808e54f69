//! Error types for moves, on both sides of the wire.
//!
//! The server raises [`MoveError`]; it travels as an [`ErrorBody`] with an
//! HTTP status; the client turns it back into a [`CommitError`] whose kind
//! decides what the user sees and whether a retry is offered.

use super::container::CapacityExceeded;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification shared by server and client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authorization,
    NotFound,
    CapacityExceeded,
    CycleDetected,
    TransientNetwork,
    Internal,
}

impl ErrorKind {
    /// Stable code carried in `details.code`.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Authorization => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::CapacityExceeded => "capacity_exceeded",
            ErrorKind::CycleDetected => "cycle_detected",
            ErrorKind::TransientNetwork => "network_error",
            ErrorKind::Internal => "internal_error",
        }
    }
}

/// Rejection of a move by the server. Any of these aborts the transaction
/// before a write happens.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("{message}")]
    Validation { message: String },

    #[error("You do not have access to this organization")]
    Authorization,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error(transparent)]
    CapacityExceeded(#[from] CapacityExceeded),

    #[error("Circular parent relationship detected")]
    CycleDetected,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MoveError {
    pub fn validation(message: impl Into<String>) -> Self {
        MoveError::Validation { message: message.into() }
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        MoveError::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MoveError::Validation { .. } => ErrorKind::Validation,
            MoveError::Authorization => ErrorKind::Authorization,
            MoveError::NotFound { .. } => ErrorKind::NotFound,
            MoveError::CapacityExceeded(_) => ErrorKind::CapacityExceeded,
            MoveError::CycleDetected => ErrorKind::CycleDetected,
            MoveError::Database(_) | MoveError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Wire body. Persistence details stay in the server log.
    pub fn to_body(&self) -> ErrorBody {
        let error = match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        };
        let details = match self {
            MoveError::CapacityExceeded(exceeded) => ErrorDetails {
                code: self.kind().code().to_string(),
                limit: Some(exceeded.limit),
                count: Some(exceeded.count),
            },
            _ => ErrorDetails::code(self.kind()),
        };
        ErrorBody {
            error,
            details: Some(details),
        }
    }
}

/// JSON error body: `{ "error": "...", "details": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorBody {
            error: error.into(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl ErrorDetails {
    pub fn code(kind: ErrorKind) -> Self {
        ErrorDetails {
            code: kind.code().to_string(),
            limit: None,
            count: None,
        }
    }
}

/// Why a commit failed, as seen by the client. Every variant rolls the
/// optimistic move back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommitError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    CapacityExceeded { limit: Option<u32>, message: String },

    #[error("{0}")]
    CycleDetected(String),

    #[error("{0}")]
    TransientNetwork(String),
}

impl CommitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommitError::Validation(_) => ErrorKind::Validation,
            CommitError::Authorization(_) => ErrorKind::Authorization,
            CommitError::NotFound(_) => ErrorKind::NotFound,
            CommitError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            CommitError::CycleDetected(_) => ErrorKind::CycleDetected,
            CommitError::TransientNetwork(_) => ErrorKind::TransientNetwork,
        }
    }

    /// Only network trouble is worth offering the same intent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CommitError::TransientNetwork(_))
    }

    /// The task or its target vanished; the local board is out of date.
    pub fn recommends_refetch(&self) -> bool {
        matches!(self, CommitError::NotFound(_))
    }

    /// Classifies a non-success response.
    pub fn from_response(status: u16, body: ErrorBody) -> Self {
        let code = body.details.as_ref().map(|details| details.code.as_str());
        match status {
            400 | 422 => match code {
                Some("capacity_exceeded") => CommitError::CapacityExceeded {
                    limit: body.details.as_ref().and_then(|details| details.limit),
                    message: body.error,
                },
                Some("cycle_detected") => CommitError::CycleDetected(body.error),
                Some(_) => CommitError::Validation(body.error),
                None if body.error.contains("WIP limit") => CommitError::CapacityExceeded {
                    limit: trailing_number(&body.error),
                    message: body.error,
                },
                None if body.error.contains("Circular parent") => CommitError::CycleDetected(body.error),
                None => CommitError::Validation(body.error),
            },
            401 | 403 => CommitError::Authorization(body.error),
            404 => CommitError::NotFound(body.error),
            408 | 429 => CommitError::TransientNetwork(body.error),
            status if status >= 500 => CommitError::TransientNetwork(body.error),
            _ => CommitError::Validation(body.error),
        }
    }
}

impl From<reqwest::Error> for CommitError {
    /// Timeouts, refused connections and unreadable bodies are all transient.
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "Request timed out".to_string()
        } else if error.is_connect() {
            "Could not reach the server".to_string()
        } else {
            format!("Network error: {}", error)
        };
        CommitError::TransientNetwork(message)
    }
}

fn trailing_number(message: &str) -> Option<u32> {
    message.rsplit(|c: char| !c.is_ascii_digit()).find(|part| !part.is_empty())?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_error_carries_limit_in_body() {
        let error = MoveError::from(CapacityExceeded { limit: 2, count: 2 });
        let body = error.to_body();
        assert_eq!(body.error, "Column has reached its WIP limit of 2");
        let details = body.details.unwrap();
        assert_eq!(details.code, "capacity_exceeded");
        assert_eq!(details.limit, Some(2));
    }

    #[test]
    fn internal_errors_hide_details() {
        let body = MoveError::Internal("worker panicked".to_string()).to_body();
        assert_eq!(body.error, "Internal server error");
    }

    #[test]
    fn classification_by_status_and_code() {
        let body = MoveError::CycleDetected.to_body();
        assert_eq!(
            CommitError::from_response(400, body),
            CommitError::CycleDetected("Circular parent relationship detected".to_string())
        );
        assert_eq!(CommitError::from_response(403, ErrorBody::new("no")).kind(), ErrorKind::Authorization);
        assert_eq!(CommitError::from_response(404, ErrorBody::new("gone")).kind(), ErrorKind::NotFound);
        assert_eq!(CommitError::from_response(503, ErrorBody::new("busy")).kind(), ErrorKind::TransientNetwork);
    }

    #[test]
    fn capacity_message_without_details_is_still_recognised() {
        let error = CommitError::from_response(400, ErrorBody::new("Column has reached its WIP limit of 5"));
        assert_eq!(
            error,
            CommitError::CapacityExceeded {
                limit: Some(5),
                message: "Column has reached its WIP limit of 5".to_string()
            }
        );
    }

    #[test]
    fn only_network_errors_are_retryable() {
        assert!(CommitError::TransientNetwork("timeout".to_string()).is_retryable());
        assert!(!CommitError::CycleDetected("loop".to_string()).is_retryable());
        assert!(CommitError::NotFound("gone".to_string()).recommends_refetch());
    }
}
