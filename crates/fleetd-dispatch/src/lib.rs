//! `fleetd-dispatch` — the boundary facade remote devices talk to.
//!
//! Composes the directory, the regime scheduler and the command queue
//! behind the three operations the transport layer maps onto: poll,
//! report_completion and submit_event. No command state lives here;
//! every call goes straight through to the owning subsystem.

pub mod dispatcher;
pub mod error;
pub mod wire;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, Result};
pub use wire::WireCommand;
