use std::sync::Arc;

use chrono::{DateTime, Utc};
use fleetd_queue::CommandQueue;
use fleetd_registry::DeviceDirectory;
use tracing::{debug, info, instrument};

use crate::clock::minute_key;
use crate::error::{Result, SchedulerError};

/// Evaluates a device's regime against the current UTC minute and, on a
/// match, enqueues the trigger command.
///
/// Read-only with respect to the directory; the only write it ever
/// performs is `queue.enqueue`. Existing commands are never mutated.
pub struct RegimeScheduler {
    directory: Arc<DeviceDirectory>,
    queue: Arc<CommandQueue>,
    trigger_opcode: String,
}

impl RegimeScheduler {
    pub fn new(
        directory: Arc<DeviceDirectory>,
        queue: Arc<CommandQueue>,
        trigger_opcode: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            queue,
            trigger_opcode: trigger_opcode.into(),
        }
    }

    /// Evaluate `device_id` against the current wall clock.
    pub fn evaluate(&self, device_id: i64) -> Result<()> {
        self.evaluate_at(device_id, Utc::now())
    }

    /// Evaluate against an explicit instant — the seam tests use to pin
    /// the clock.
    ///
    /// Fetches the device (`DeviceNotFound` if absent), truncates `now`
    /// to its "HH:MM" minute key and looks that up in the regime. A miss
    /// is a no-op; a hit enqueues one trigger command with empty kwargs.
    /// No dedup across calls: evaluating twice in the same minute
    /// enqueues twice.
    #[instrument(skip(self, now))]
    pub fn evaluate_at(&self, device_id: i64, now: DateTime<Utc>) -> Result<()> {
        let device = self
            .directory
            .get(device_id)?
            .ok_or(SchedulerError::DeviceNotFound { id: device_id })?;

        let key = minute_key(now);
        if !device.regime.contains_key(&key) {
            debug!(device_id, %key, "no regime entry for this minute");
            return Ok(());
        }

        let command =
            self.queue
                .enqueue(device_id, &self.trigger_opcode, serde_json::json!({}))?;
        info!(
            device_id,
            command_id = command.id,
            %key,
            "regime slot fired"
        );
        Ok(())
    }
}
