use thiserror::Error;

/// Errors that can occur within the command queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The target device for an enqueue does not exist.
    #[error("Device not found: {id}")]
    DeviceNotFound { id: i64 },

    /// No command with the given id exists in the store.
    #[error("Command not found: {id}")]
    CommandNotFound { id: i64 },

    /// The update is malformed (e.g. attempting to move a command to
    /// another device — `device_id` is immutable after creation).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, QueueError>;
