//! Service error types with HTTP status code mapping.
//!
//! [`LiveError`] is the boundary error type. Each variant maps to one HTTP
//! status and a JSON body whose message is the generic reason phrase for
//! that status; the underlying cause is logged, never echoed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::persistence::StoreError;

/// Structured JSON error response body.
///
/// ```json
/// { "error": { "code": 403, "message": "Forbidden" } }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and generic message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// HTTP status code, repeated for clients that only see the body.
    pub code: u16,
    /// Generic, non-revealing message.
    pub message: String,
}

/// Server-side error enum with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    /// The admin key or bearer token was refused.
    #[error("authentication denied")]
    AuthDenied(#[source] AuthError),

    /// A valid token was presented for another user's path.
    #[error("token subject {token_user} does not match path user {path_user}")]
    Forbidden {
        /// Subject carried by the token.
        token_user: String,
        /// User ID taken from the request path.
        path_user: String,
    },

    /// Request framing or payload could not be understood.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// The body's declared length is missing.
    #[error("content-length required")]
    LengthRequired,

    /// The body's declared length exceeds the accepted maximum.
    #[error("payload of {declared} bytes exceeds {limit}")]
    PayloadTooLarge {
        /// Declared `Content-Length`.
        declared: usize,
        /// Accepted maximum.
        limit: usize,
    },

    /// The body is not in the accepted content type.
    #[error("unsupported content type: {0}")]
    NotAcceptable(String),

    /// The update duplicates one already stored.
    #[error("duplicate track update")]
    Conflict,

    /// The store failed to record the update.
    #[error("storage failure: {0}")]
    StorageFailure(#[source] StoreError),

    /// The operation is reserved but not supported.
    #[error("not implemented")]
    NotImplemented,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LiveError {
    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthDenied(_) | Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::LengthRequired => StatusCode::LENGTH_REQUIRED,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            Self::Conflict | Self::StorageFailure(_) => StatusCode::INSUFFICIENT_STORAGE,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a failed write. Duplicates are an expected outcome of producer
    /// retries and keep their own variant so they are not logged as faults.
    #[must_use]
    pub fn from_write(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::Conflict,
            StoreError::NotImplemented => Self::NotImplemented,
            other => Self::StorageFailure(other),
        }
    }

    /// Maps a failed read.
    #[must_use]
    pub fn from_read(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<AuthError> for LiveError {
    fn from(err: AuthError) -> Self {
        Self::AuthDenied(err)
    }
}

impl IntoResponse for LiveError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, source = ?std::error::Error::source(&self), "request failed");
            }
            // logged with request context where the write failed
            Self::Conflict | Self::StorageFailure(_) => {
                tracing::debug!(error = %self, "write rejected");
            }
            _ => tracing::warn!(error = %self, source = ?std::error::Error::source(&self), "request rejected"),
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Error").to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
