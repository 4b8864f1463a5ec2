use thiserror::Error;

/// Errors that can occur during regime evaluation.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The device being evaluated does not exist.
    #[error("Device not found: {id}")]
    DeviceNotFound { id: i64 },

    /// The directory lookup failed.
    #[error(transparent)]
    Registry(#[from] fleetd_registry::RegistryError),

    /// Enqueueing the triggered command failed.
    #[error(transparent)]
    Queue(#[from] fleetd_queue::QueueError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
