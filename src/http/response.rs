//! Error-to-response mapping.
//!
//! Bodies are deliberately generic; details go to the logs only.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::notes::NoteError;
use crate::security::AccessError;

/// Everything a handler or the auth middleware can fail with.
#[derive(Debug)]
pub enum ApiError {
    Note(NoteError),
    /// Bearer token missing or not recognised.
    Unauthorized,
    RateLimited { retry_after_secs: u64 },
    Internal(String),
}

impl From<NoteError> for ApiError {
    fn from(err: NoteError) -> Self {
        ApiError::Note(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Note(e) => match e {
                NoteError::Access(AccessError::Unauthenticated) => StatusCode::UNAUTHORIZED,
                NoteError::Access(AccessError::Forbidden) => StatusCode::FORBIDDEN,
                NoteError::NotFound => StatusCode::NOT_FOUND,
                NoteError::Conflict { .. } => StatusCode::CONFLICT,
                NoteError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
                NoteError::DataIntegrity { .. } | NoteError::Config(_) | NoteError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::RateLimited { .. } => "Too many attempts".to_string(),
            ApiError::Internal(_) => "Internal error".to_string(),
            ApiError::Note(e) => match e {
                NoteError::Access(AccessError::Unauthenticated) => "Unauthorized".to_string(),
                NoteError::Access(AccessError::Forbidden) => "Access denied".to_string(),
                NoteError::NotFound => "Note not found".to_string(),
                NoteError::Conflict { .. } => "Note was modified concurrently".to_string(),
                NoteError::InvalidInput(msg) => msg.clone(),
                NoteError::DataIntegrity { .. } | NoteError::Config(_) | NoteError::Store(_) => {
                    "Internal error".to_string()
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(msg) => tracing::error!(error = %msg, "Request failed"),
            ApiError::Note(e @ (NoteError::Config(_) | NoteError::Store(_))) => {
                tracing::error!(error = %e, "Request failed")
            }
            _ => {}
        }

        let mut response = (status, Json(json!({ "error": self.public_message() }))).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Note(NoteError::NotFound), StatusCode::NOT_FOUND),
            (
                ApiError::Note(NoteError::Access(AccessError::Forbidden)),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::Note(NoteError::DataIntegrity {
                    note_id: "n1".into(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Note(NoteError::Conflict {
                    note_id: "n1".into(),
                }),
                StatusCode::CONFLICT,
            ),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn test_integrity_message_is_generic() {
        let err = ApiError::Note(NoteError::DataIntegrity {
            note_id: "n1".into(),
        });
        assert_eq!(err.public_message(), "Internal error");
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited {
            retry_after_secs: 42,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }
}
