//! `fleetd-registry` — the durable registry of users and devices.
//!
//! Two managers over the same SQLite file: [`users::UserStore`] for the
//! account records devices hang off, and [`directory::DeviceDirectory`]
//! for the devices themselves, including the per-device regime table the
//! scheduler reads. The directory is the only component that writes
//! `Device` rows; the scheduler treats it as read-only.

pub mod db;
pub mod directory;
pub mod error;
pub mod types;
pub mod users;

pub use directory::DeviceDirectory;
pub use error::{RegistryError, Result};
pub use types::{Device, DeviceFilter, DevicePatch, NewDevice, NewUser, Regime, User, UserFilter, UserPatch};
pub use users::UserStore;
