// errors.rs
use thiserror::Error;

use crate::domain::status::Status;

/// Failures of the complaint lifecycle itself: intake, transitions, lookups.
/// Every variant leaves the stored complaint untouched.
#[derive(Debug, Error)]
pub enum ComplaintError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("complaint {0} not found")]
    NotFound(i64),
    #[error("cannot move complaint from {from} to {to}")]
    IllegalTransition { from: Status, to: Status },
    #[error("complaint changed concurrently (expected revision {expected}, found {actual})")]
    Conflict { expected: i64, actual: i64 },
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for ComplaintError {
    fn from(e: rusqlite::Error) -> Self {
        ComplaintError::Storage(e.to_string())
    }
}

/// Errors originating from either the server logic
/// (routing, missing resources, etc.) or downstream layers (DB).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden")]
    Forbidden,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unprocessable: {0}")]
    Unprocessable(String),
    #[error("Database Error: {0}")]
    DbError(String),
    #[error("Internal Server Error")]
    InternalError,
}

impl From<ServerError> for ComplaintError {
    fn from(e: ServerError) -> Self {
        ComplaintError::Storage(e.to_string())
    }
}

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        ServerError::DbError(e.to_string())
    }
}

impl From<ComplaintError> for ServerError {
    fn from(e: ComplaintError) -> Self {
        match e {
            ComplaintError::Validation(msg) => ServerError::BadRequest(msg),
            ComplaintError::NotFound(_) => ServerError::NotFound,
            e @ ComplaintError::IllegalTransition { .. } => ServerError::Unprocessable(e.to_string()),
            e @ ComplaintError::Conflict { .. } => ServerError::Conflict(e.to_string()),
            ComplaintError::Storage(msg) => ServerError::DbError(msg),
            ComplaintError::Delivery(_) => ServerError::InternalError,
        }
    }
}
