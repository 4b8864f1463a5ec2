use std::sync::Arc;

use chrono::{DateTime, Utc};
use fleetd_queue::{Command, CommandQueue};
use fleetd_registry::DeviceDirectory;
use fleetd_scheduler::RegimeScheduler;
use tracing::{info, instrument};

use crate::error::Result;

/// The single entry point invoked by remote devices.
///
/// Constructed once in `main` with explicit references — there is no
/// ambient registry of managers anywhere in the workspace.
pub struct Dispatcher {
    directory: Arc<DeviceDirectory>,
    scheduler: RegimeScheduler,
    queue: Arc<CommandQueue>,
}

impl Dispatcher {
    pub fn new(
        directory: Arc<DeviceDirectory>,
        scheduler: RegimeScheduler,
        queue: Arc<CommandQueue>,
    ) -> Self {
        Self {
            directory,
            scheduler,
            queue,
        }
    }

    /// Device poll: evaluate the regime for the current minute, then
    /// atomically claim everything pending.
    pub fn poll(&self, device_id: i64) -> Result<Vec<Command>> {
        self.poll_at(device_id, Utc::now())
    }

    /// Clock-injected poll. Evaluate first; if that fails the claim is
    /// not attempted, so a failed poll leaves the queue untouched.
    #[instrument(skip(self, now))]
    pub fn poll_at(&self, device_id: i64, now: DateTime<Utc>) -> Result<Vec<Command>> {
        self.scheduler.evaluate_at(device_id, now)?;
        let claimed = self.queue.claim_pending(device_id)?;
        self.directory.touch_last_seen(device_id)?;
        info!(device_id, count = claimed.len(), "poll served");
        Ok(claimed)
    }

    /// Forward a device's completion report to the queue.
    pub fn report_completion(&self, command_id: i64, status: i64) -> Result<()> {
        self.queue.report_completion(command_id, status)?;
        Ok(())
    }

    /// Out-of-band telemetry sink: log the event and refresh the
    /// device's `last_seen`. No command state transition.
    #[instrument(skip(self, payload))]
    pub fn submit_event(&self, device_id: i64, payload: &serde_json::Value) -> Result<()> {
        self.directory.touch_last_seen(device_id)?;
        info!(device_id, event = %payload, "device event received");
        Ok(())
    }
}
