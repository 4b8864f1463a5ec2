//! `fleetd-core` — shared configuration and id types for the fleetd
//! workspace. No business logic lives here.

pub mod config;
pub mod types;
