use thiserror::Error;

/// Facade errors — thin wrappers so sub-system failures propagate to the
/// transport layer unchanged.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Scheduler(#[from] fleetd_scheduler::SchedulerError),

    #[error(transparent)]
    Queue(#[from] fleetd_queue::QueueError),

    #[error(transparent)]
    Registry(#[from] fleetd_registry::RegistryError),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
