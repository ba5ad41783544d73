use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

use crate::models::application::ApplicationStatus;
use crate::models::post::PostRef;
use crate::models::profile::Role;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("user {user_id} has no {role} profile")]
    ActorProfileNotFound { role: Role, user_id: Uuid },

    #[error("{0} not found")]
    PostNotFound(PostRef),

    #[error("{post} is no longer accepting applications (status {status})")]
    PostNotAcceptingApplications { post: PostRef, status: &'static str },

    #[error("artist {artist_id} already applied to {post}")]
    DuplicateApplication { post: PostRef, artist_id: Uuid },

    #[error("application {0} not found")]
    ApplicationNotFound(i64),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("application {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: i64,
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("application {id} is {status}, only accepted applications can become projects")]
    ApplicationNotAccepted { id: i64, status: ApplicationStatus },

    #[error("{0}")]
    ApplicationLocked(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable machine-readable kind, returned next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::BadRequest(_) => "bad_request",
            Error::Unauthorized(_) => "unauthorized",
            Error::Forbidden(_) => "forbidden",
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::ActorProfileNotFound { .. } => "actor_profile_not_found",
            Error::PostNotFound(_) => "post_not_found",
            Error::PostNotAcceptingApplications { .. } => "post_not_accepting_applications",
            Error::DuplicateApplication { .. } => "duplicate_application",
            Error::ApplicationNotFound(_) => "application_not_found",
            Error::InvalidStatus(_) => "invalid_status",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::ApplicationNotAccepted { .. } => "application_not_accepted",
            Error::ApplicationLocked(_) => "application_locked",
            Error::Storage(_) => "storage_error",
            Error::Validation(_) => "validation",
            Error::Json(_) => "bad_request",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_)
            | Error::InvalidStatus(_)
            | Error::Validation(_)
            | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_)
            | Error::ActorProfileNotFound { .. }
            | Error::PostNotFound(_)
            | Error::ApplicationNotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_)
            | Error::PostNotAcceptingApplications { .. }
            | Error::DuplicateApplication { .. }
            | Error::InvalidTransition { .. }
            | Error::ApplicationNotAccepted { .. }
            | Error::ApplicationLocked(_) => StatusCode::CONFLICT,
            Error::Storage(_) | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let code = self.code();
        let error_message = match &self {
            Error::Storage(err) => {
                tracing::error!(error = ?err, "storage failure");
                "An unexpected error occurred".to_string()
            }
            Error::Config(msg) => {
                tracing::error!(error = %msg, "configuration failure");
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "error": error_message, "code": code }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Storage(StoreError::Database(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_map_to_actionable_statuses() {
        let post = PostRef::Job(Uuid::new_v4());
        assert_eq!(Error::PostNotFound(post).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::PostNotAcceptingApplications { post, status: "closed" }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::InvalidStatus("approved".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::ApplicationNotAccepted {
                id: 3,
                status: ApplicationStatus::Pending
            }
            .code(),
            "application_not_accepted"
        );
    }

    #[test]
    fn storage_errors_are_opaque() {
        let err = Error::Storage(StoreError::Unavailable("pool closed".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
