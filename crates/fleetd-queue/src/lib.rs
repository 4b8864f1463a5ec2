//! `fleetd-queue` — the pull-based command queue.
//!
//! Owns the full `Command` lifecycle: creation (operator or scheduler),
//! batch claim when a device polls, and terminal completion reporting.
//! The claim step is a single conditional UPDATE, so concurrent polls
//! for the same device partition the pending set exactly — a command is
//! claimed by one caller, never both and never neither.

pub mod db;
pub mod error;
pub mod queue;
pub mod types;

pub use error::{QueueError, Result};
pub use queue::CommandQueue;
pub use types::{Command, CommandFilter, CommandPatch, CommandState};
