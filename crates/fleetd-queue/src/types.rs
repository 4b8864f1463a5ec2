use chrono::{DateTime, Utc};
use fleetd_core::types::{CommandId, DeviceId};
use serde::{Deserialize, Serialize};

/// Queue-lifecycle state of a command.
///
/// The application-level outcome reported by the device lives in
/// [`Command::result_code`], not here — the two were one overloaded
/// integer in earlier iterations of this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandState {
    /// Queued, not yet claimed by the device.
    Pending,
    /// Claimed by a device poll, awaiting the completion report.
    Dispatched,
    /// The device reported a result; see `result_code`.
    Completed,
}

impl std::fmt::Display for CommandState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CommandState::Pending => "pending",
            CommandState::Dispatched => "dispatched",
            CommandState::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for CommandState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CommandState::Pending),
            "dispatched" => Ok(CommandState::Dispatched),
            "completed" => Ok(CommandState::Completed),
            other => Err(format!("unknown command state: {other}")),
        }
    }
}

/// A unit of work queued for a specific device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    /// Creation timestamp; epoch seconds in JSON.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date_time: DateTime<Utc>,
    /// Immutable after creation.
    pub device_id: DeviceId,
    /// Opcode string interpreted by the device firmware.
    pub command: String,
    /// Opaque argument map, stored and returned verbatim.
    pub kwargs: serde_json::Value,
    pub state: CommandState,
    /// Device-supplied completion code, set only once `state` is
    /// `Completed`. Stored verbatim, never interpreted.
    pub result_code: Option<i64>,
}

impl Command {
    /// The legacy single-integer status devices speak on the wire:
    /// 0 = pending, 1 = dispatched, completed = the reported code.
    pub fn status_code(&self) -> i64 {
        match self.state {
            CommandState::Pending => 0,
            CommandState::Dispatched => 1,
            CommandState::Completed => self.result_code.unwrap_or(2),
        }
    }
}

/// Nullable-field equality filter; absent fields mean no constraint.
///
/// `status` takes the wire integer: 0 matches Pending, 1 Dispatched,
/// anything else matches Completed commands with that result code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandFilter {
    pub id: Option<CommandId>,
    pub device_id: Option<DeviceId>,
    pub command: Option<String>,
    pub status: Option<i64>,
    /// Epoch seconds, exact match.
    pub date_time: Option<i64>,
}

/// Partial admin update — only supplied fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandPatch {
    pub id: CommandId,
    /// Present only to be rejected: `device_id` is immutable.
    pub device_id: Option<DeviceId>,
    pub command: Option<String>,
    pub kwargs: Option<serde_json::Value>,
    /// Wire integer, folded back into state/result_code.
    pub status: Option<i64>,
}
