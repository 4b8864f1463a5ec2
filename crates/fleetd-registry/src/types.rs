use std::collections::BTreeMap;

use fleetd_core::types::{DeviceId, UserId};
use serde::{Deserialize, Serialize};

/// Minute-resolution trigger table: "HH:MM" (UTC) → opaque trigger payload.
///
/// The payload is stored and returned verbatim; only the presence of a key
/// at the current minute matters to the scheduler.
pub type Regime = BTreeMap<String, serde_json::Value>;

/// True if `key` is a valid minute key: zero-padded "HH:MM", 24-hour UTC.
///
/// The evaluator formats the current time with the same grammar, so a key
/// like "9:00" or "09:60" would silently never fire — reject it at write
/// time instead.
pub fn is_minute_key(key: &str) -> bool {
    let bytes = key.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !digits(&key[..2]) || !digits(&key[3..]) {
        return false;
    }
    let hour: u8 = key[..2].parse().unwrap_or(99);
    let minute: u8 = key[3..].parse().unwrap_or(99);
    hour < 24 && minute < 60
}

/// An account that owns devices. Not otherwise part of the dispatch core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Unique across all users.
    pub email: String,
    pub password: String,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

/// A managed remote endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    /// Unique per owner.
    pub name: String,
    pub user_id: UserId,
    /// RFC3339 timestamp of the last poll or event from this device.
    pub last_seen: String,
    /// Free-form status string reported by operators ("online", "fault", …).
    pub status: String,
    pub regime: Regime,
}

// ── Creation / patch / filter payloads ───────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDevice {
    pub name: String,
    pub user_id: UserId,
    pub status: String,
    #[serde(default)]
    pub regime: Regime,
}

/// Partial update — only supplied fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub id: UserId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Partial update — only supplied fields change. Reassigning `user_id`
/// is allowed but validated against the users table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevicePatch {
    pub id: DeviceId,
    pub name: Option<String>,
    pub user_id: Option<UserId>,
    pub status: Option<String>,
    pub regime: Option<Regime>,
}

/// Nullable-field equality filter; absent fields mean no constraint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub id: Option<UserId>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Nullable-field equality filter; absent fields mean no constraint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceFilter {
    pub id: Option<DeviceId>,
    pub name: Option<String>,
    pub user_id: Option<UserId>,
    pub status: Option<String>,
}
