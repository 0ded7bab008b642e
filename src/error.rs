//! Session error taxonomy

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by session operations.
///
/// Request/response operations (join, toggles) return these to the caller;
/// fire-and-forget operations log them and drop the event.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Room does not exist.")]
    RoomNotFound,

    #[error("Only the room creator can perform this action.")]
    PermissionDenied,

    #[error("Invalid user ID.")]
    InvalidUser,

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::RoomNotFound => SessionError::RoomNotFound,
            other => SessionError::Storage(other.to_string()),
        }
    }
}

impl SessionError {
    /// Wire-level error code sent back to the client.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::RoomNotFound => "ROOM_NOT_FOUND",
            SessionError::PermissionDenied => "PERMISSION_DENIED",
            SessionError::InvalidUser => "INVALID_USER",
            SessionError::Storage(_) => "STORAGE_FAILURE",
        }
    }
}
