use thiserror::Error;

/// All registry-layer errors. Kept separate from the queue's errors so
/// the gateway can map each to an HTTP status without coupling layers.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("User not found: {id}")]
    UserNotFound { id: i64 },

    #[error("Device not found: {id}")]
    DeviceNotFound { id: i64 },

    /// Uniqueness violation — duplicate email, or duplicate device name
    /// under the same owner.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Required creation/update fields missing or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// True when `e` is SQLite's UNIQUE/constraint violation — the registry
/// surfaces those as [`RegistryError::Conflict`] rather than a 500.
pub(crate) fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(info, _)
            if info.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
