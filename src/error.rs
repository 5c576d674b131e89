//! Error types for the store, the messaging fabric, and the write path,
//! with HTTP status code mapping.
//!
//! [`GuestbookError`] is what the service returns and what handlers render.
//! It keeps the distinction between "nothing happened" (validation or store
//! failure) and "entry saved, notification failed" (publish failure).

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::GuestbookEntry;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid entry: name must not be empty",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`GuestbookError`] code ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Failure of an entry store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database I/O or query failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An entry with the same id is already stored.
    #[error("entry {0} already exists")]
    Conflict(String),

    /// The durable schema is not present; raised at startup.
    #[error("schema missing: {0}")]
    SchemaMissing(String),

    /// The store did not answer within the configured bound.
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    /// The backend cannot serve requests.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by the messaging fabric.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// The event could not be encoded for transport.
    #[error("event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Publish or bind targeted an exchange that was never declared.
    #[error("exchange not found: {0}")]
    ExchangeNotFound(String),

    /// The broker is shut down or cannot be reached.
    #[error("broker unreachable: {0}")]
    Unreachable(String),

    /// The broker received the message but refused it.
    #[error("broker rejected message: {0}")]
    Rejected(String),

    /// The broker did not acknowledge the send within the configured bound.
    #[error("publish timed out after {0:?}")]
    Timeout(Duration),

    /// AMQP client failure.
    #[cfg(feature = "amqp")]
    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),
}

/// Error returned by the write orchestrator and rendered by handlers.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status               |
/// |-----------|------------|---------------------------|
/// | 1000–1999 | Validation | 400 Bad Request           |
/// | 2000–2999 | Not Found  | 404 Not Found             |
/// | 3000–3999 | Server     | 500 / 502                 |
#[derive(Debug, thiserror::Error)]
pub enum GuestbookError {
    /// A required field was missing or empty. Nothing was stored.
    #[error("invalid entry: {0}")]
    Validation(String),

    /// The store failed. The entry was not stored and nothing was published.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    /// The entry was stored but the notification could not be handed to the
    /// messaging fabric. There is no rollback.
    #[error("entry {} was saved but the notification failed: {source}", .entry.id())]
    Publish {
        /// The entry as persisted.
        entry: Box<GuestbookEntry>,
        /// Why the broker refused the send.
        source: BrokerError,
    },

    /// No entry with the given id. Only produced at the HTTP boundary; the
    /// service itself reports absence as `None`.
    #[error("entry not found: {0}")]
    EntryNotFound(String),
}

impl GuestbookError {
    /// Returns `true` when the entry was persisted even though the overall
    /// operation failed.
    #[must_use]
    pub const fn is_partial_success(&self) -> bool {
        matches!(self, Self::Publish { .. })
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::EntryNotFound(_) => 2001,
            Self::Store(_) => 3001,
            Self::Publish { .. } => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::EntryNotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Publish { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::Publish { entry, .. } => Some(format!(
                "entry {} was persisted; the notification was not sent",
                entry.id()
            )),
            _ => None,
        }
    }
}

impl IntoResponse for GuestbookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntryClock;

    fn publish_failure() -> GuestbookError {
        GuestbookError::Publish {
            entry: Box::new(GuestbookEntry::new("Ada", "hi", &EntryClock::new())),
            source: BrokerError::Unreachable("closed".to_string()),
        }
    }

    #[test]
    fn only_publish_failure_is_partial_success() {
        assert!(publish_failure().is_partial_success());
        assert!(!GuestbookError::Validation("x".to_string()).is_partial_success());
        assert!(
            !GuestbookError::Store(StoreError::Unavailable("down".to_string()))
                .is_partial_success()
        );
    }

    #[test]
    fn status_codes_distinguish_failure_kinds() {
        assert_eq!(
            GuestbookError::Validation("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GuestbookError::EntryNotFound("x".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GuestbookError::Store(StoreError::Timeout(Duration::from_millis(5))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(publish_failure().status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn publish_failure_names_the_saved_entry() {
        let err = publish_failure();
        let GuestbookError::Publish { entry, .. } = &err else {
            unreachable!();
        };
        let id = entry.id().to_string();
        assert!(err.to_string().contains(&id));
        assert!(err.details().unwrap_or_default().contains(&id));
    }

    #[test]
    fn into_response_sets_status() {
        let response = GuestbookError::Validation("name must not be empty".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
