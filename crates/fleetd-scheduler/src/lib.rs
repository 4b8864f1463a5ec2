//! `fleetd-scheduler` — regime evaluation, the time-triggered half of the
//! command pipeline.
//!
//! There is deliberately no background timer here: [`RegimeScheduler::evaluate`]
//! fires synchronously, once, whenever it is invoked — which in practice is
//! every device poll. Schedule freshness is therefore coupled to polling
//! cadence: a device that never polls never receives its scheduled command,
//! and a device that polls twice in one minute gets the command twice.
//! Both are accepted behaviour, not defects.

pub mod clock;
pub mod error;
pub mod scheduler;

pub use clock::minute_key;
pub use error::{Result, SchedulerError};
pub use scheduler::RegimeScheduler;
