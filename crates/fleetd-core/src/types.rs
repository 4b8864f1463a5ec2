//! Integer id aliases shared across crates.
//!
//! Ids are SQLite `INTEGER PRIMARY KEY` rowids — autoincrementing
//! signed 64-bit integers, matching what devices send on the wire.

pub type UserId = i64;
pub type DeviceId = i64;
pub type CommandId = i64;
