use crate::db::errors::DbError;
use crate::types::Operation;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Caller is authenticated but does not own (or administer) the resource
    #[error("Insufficient permissions to {action} {resource}")]
    Forbidden { action: Operation, resource: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Requested resource not found, reported with a route-specific message
    #[error("{message}")]
    Missing { message: String },

    /// Conflict with existing state, e.g. a duplicate favourite
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// A feature is switched off in configuration
    #[error("{message}")]
    Unavailable { message: String },

    /// A third-party provider rejected or failed the request
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: StatusCode, message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Map a unique constraint to the message a client should see.
fn unique_violation_message(table: Option<&str>, constraint: Option<&str>) -> (&'static str, &'static str) {
    match (table, constraint) {
        (Some("users"), Some(c)) if c.contains("email") => ("User with this email already exists", "user"),
        (Some("agencies"), Some(c)) if c.contains("email") => ("Email already in use", "agency"),
        (Some("favorite_locations"), _) => ("Location is already a favorite", "favorite"),
        (Some("saved_events"), _) => ("Event already saved", "saved_event"),
        (Some("saved_blogs"), _) => ("Blog already saved", "saved_blog"),
        (Some("trip_participants"), _) => ("User is already a participant in this trip", "trip_participant"),
        (Some("tour_reviews"), _) => ("You have already reviewed this tour", "review"),
        (Some("blog_votes" | "comment_votes" | "reply_votes"), _) => ("A vote for this target is already being recorded", "vote"),
        _ => ("Resource already exists", "unknown"),
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } | Error::Missing { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::Upstream { status, .. } => {
                if status.is_client_error() {
                    *status
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::Forbidden { action, resource } => {
                format!("You do not have permission to {} this {resource}", action.to_string().to_lowercase())
            }
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} not found")
            }
            Error::Missing { message } => message.clone(),
            Error::Conflict { message } => message.clone(),
            Error::Unavailable { message } => message.clone(),
            Error::Upstream { message, .. } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => {
                    unique_violation_message(table.as_deref(), constraint.as_deref()).0.to_string()
                }
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Upstream { status, .. } if status.is_server_error() => {
                tracing::error!("Upstream provider error: {}", self);
            }
            Error::Upstream { .. } => {
                tracing::warn!("Upstream provider rejected request: {}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::Forbidden { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::Missing { .. } | Error::Unavailable { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
        }

        let status = self.status_code();

        match &self {
            Error::Conflict { message } => {
                let body = serde_json::json!({ "message": message });
                (status, axum::response::Json(body)).into_response()
            }
            // Handle database unique violations with minimal structured JSON
            Error::Database(DbError::UniqueViolation { constraint, table, .. }) => {
                let (message, resource) = unique_violation_message(table.as_deref(), constraint.as_deref());
                let body = serde_json::json!({
                    "message": message,
                    "resource": resource
                });

                (status, axum::response::Json(body)).into_response()
            }
            _ => {
                let user_message = self.user_message();
                (status, user_message).into_response()
            }
        }
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
