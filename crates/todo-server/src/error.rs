use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use todo_shared::constants::{
    MSG_CONTACT_FAILED, MSG_INVALID_CREDENTIALS, MSG_SERVER_ERROR, MSG_TODO_NOT_FOUND,
    MSG_USER_EXISTS,
};
use todo_shared::protocol::MessageResponse;
use todo_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User already exists")]
    DuplicateEmail,

    /// Unknown email and wrong password are reported identically.
    #[error("Invalid Email or Password")]
    InvalidCredentials,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Contact message could not be stored: {0}")]
    ContactFailed(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => ServerError::Validation(msg),
            StoreError::DuplicateEmail => ServerError::DuplicateEmail,
            // tasks are the only records addressed by id over HTTP
            StoreError::NotFound => ServerError::NotFound(MSG_TODO_NOT_FOUND.to_string()),
            other => ServerError::Storage(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::DuplicateEmail => (StatusCode::BAD_REQUEST, MSG_USER_EXISTS.to_string()),
            ServerError::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, MSG_INVALID_CREDENTIALS.to_string())
            }
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServerError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ServerError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ServerError::ContactFailed(_) => {
                tracing::error!(error = %self, "contact submission failed");
                (StatusCode::INTERNAL_SERVER_ERROR, MSG_CONTACT_FAILED.to_string())
            }
            ServerError::Storage(_) | ServerError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_ERROR.to_string())
            }
        };

        (status, axum::Json(MessageResponse::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status() {
        let cases = [
            (StoreError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (StoreError::DuplicateEmail, StatusCode::BAD_REQUEST),
            (StoreError::NotFound, StatusCode::NOT_FOUND),
            (
                StoreError::Migration("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (store_err, status) in cases {
            let response = ServerError::from(store_err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[tokio::test]
    async fn test_internal_detail_not_leaked() {
        let response = ServerError::Storage("disk I/O error at /var/db".into()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: MessageResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.message, MSG_SERVER_ERROR);
    }
}
