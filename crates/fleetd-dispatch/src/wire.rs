use fleetd_queue::Command;
use serde::Serialize;

/// The command shape devices receive from a poll:
/// `{id, date_time (epoch seconds), device_id, command, kwargs, status}`.
///
/// `status` is the folded wire integer (0 pending, 1 dispatched,
/// completed = the reported code) — device firmware predates the split
/// lifecycle and keeps speaking the single-field form.
#[derive(Debug, Clone, Serialize)]
pub struct WireCommand {
    pub id: i64,
    pub date_time: i64,
    pub device_id: i64,
    pub command: String,
    pub kwargs: serde_json::Value,
    pub status: i64,
}

impl From<&Command> for WireCommand {
    fn from(cmd: &Command) -> Self {
        Self {
            id: cmd.id,
            date_time: cmd.date_time.timestamp(),
            device_id: cmd.device_id,
            command: cmd.command.clone(),
            kwargs: cmd.kwargs.clone(),
            status: cmd.status_code(),
        }
    }
}
