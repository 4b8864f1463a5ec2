use std::sync::Mutex;

use rusqlite::{Connection, ToSql};
use tracing::{debug, info, instrument};

use crate::db::row_to_device;
use crate::error::{is_constraint_violation, RegistryError, Result};
use crate::types::{is_minute_key, Device, DeviceFilter, DevicePatch, NewDevice, Regime};

const DEVICE_SELECT: &str =
    "SELECT id, name, user_id, last_seen, status, regime FROM devices";

/// Thread-safe directory of managed devices.
///
/// Owns all `Device` writes. The scheduler only ever reads through
/// [`DeviceDirectory::get`]; the dispatch facade additionally refreshes
/// `last_seen` via [`DeviceDirectory::touch_last_seen`] on device traffic.
pub struct DeviceDirectory {
    db: Mutex<Connection>,
}

impl DeviceDirectory {
    /// Wrap an already-open (and `init_db`-initialised) connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Fetch a device by id, `None` if it does not exist.
    pub fn get(&self, id: i64) -> Result<Option<Device>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            &format!("{DEVICE_SELECT} WHERE id = ?1"),
            rusqlite::params![id],
            row_to_device,
        ) {
            Ok(d) => Ok(Some(d)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(RegistryError::Database(e)),
        }
    }

    /// Equality-filtered listing; absent filter fields mean no constraint.
    pub fn query(&self, filter: &DeviceFilter) -> Result<Vec<Device>> {
        let mut sql = format!("{DEVICE_SELECT} WHERE 1=1");
        let mut params: Vec<&dyn ToSql> = Vec::new();
        if let Some(ref id) = filter.id {
            sql.push_str(" AND id = ?");
            params.push(id);
        }
        if let Some(ref name) = filter.name {
            sql.push_str(" AND name = ?");
            params.push(name);
        }
        if let Some(ref user_id) = filter.user_id {
            sql.push_str(" AND user_id = ?");
            params.push(user_id);
        }
        if let Some(ref status) = filter.status {
            sql.push_str(" AND status = ?");
            params.push(status);
        }

        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map(&params[..], row_to_device)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Create a device. The owner must exist; regime keys must be valid
    /// "HH:MM" minute keys; a duplicate name per owner is a `Conflict`.
    #[instrument(skip(self, new), fields(name = %new.name, user_id = new.user_id))]
    pub fn create(&self, new: &NewDevice) -> Result<Device> {
        if new.name.is_empty() {
            return Err(RegistryError::InvalidInput(
                "device creation requires a name".into(),
            ));
        }
        validate_regime(&new.regime)?;

        let db = self.db.lock().unwrap();
        let owner_exists: bool = db
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                rusqlite::params![new.user_id],
                |row| row.get(0),
            )?;
        if !owner_exists {
            return Err(RegistryError::UserNotFound { id: new.user_id });
        }

        let now = chrono::Utc::now().to_rfc3339();
        let regime_json = serde_json::to_string(&new.regime)
            .map_err(|e| RegistryError::InvalidInput(format!("bad regime: {e}")))?;
        db.execute(
            "INSERT INTO devices (name, user_id, last_seen, status, regime)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![new.name, new.user_id, now, new.status, regime_json],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                RegistryError::Conflict(format!(
                    "device name already taken for user {}: {}",
                    new.user_id, new.name
                ))
            } else {
                e.into()
            }
        })?;

        let id = db.last_insert_rowid();
        info!(device_id = id, "device registered");
        Ok(Device {
            id,
            name: new.name.clone(),
            user_id: new.user_id,
            last_seen: now,
            status: new.status.clone(),
            regime: new.regime.clone(),
        })
    }

    /// Update only the supplied fields. Returns the post-update record.
    #[instrument(skip(self, patch), fields(device_id = patch.id))]
    pub fn patch(&self, patch: &DevicePatch) -> Result<Device> {
        let regime_json = match patch.regime {
            Some(ref regime) => {
                validate_regime(regime)?;
                Some(
                    serde_json::to_string(regime)
                        .map_err(|e| RegistryError::InvalidInput(format!("bad regime: {e}")))?,
                )
            }
            None => None,
        };

        let mut sets = Vec::new();
        let mut params: Vec<&dyn ToSql> = Vec::new();
        if let Some(ref name) = patch.name {
            sets.push("name = ?");
            params.push(name);
        }
        if let Some(ref user_id) = patch.user_id {
            sets.push("user_id = ?");
            params.push(user_id);
        }
        if let Some(ref status) = patch.status {
            sets.push("status = ?");
            params.push(status);
        }
        if let Some(ref json) = regime_json {
            sets.push("regime = ?");
            params.push(json);
        }
        if sets.is_empty() {
            return Err(RegistryError::InvalidInput(
                "patch must supply at least one field".into(),
            ));
        }
        let sql = format!("UPDATE devices SET {} WHERE id = ?", sets.join(", "));
        params.push(&patch.id);

        let db = self.db.lock().unwrap();
        if let Some(user_id) = patch.user_id {
            let owner_exists: bool = db.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                rusqlite::params![user_id],
                |row| row.get(0),
            )?;
            if !owner_exists {
                return Err(RegistryError::UserNotFound { id: user_id });
            }
        }

        let n = db.execute(&sql, &params[..]).map_err(|e| {
            if is_constraint_violation(&e) {
                RegistryError::Conflict("device name already taken for that user".into())
            } else {
                RegistryError::from(e)
            }
        })?;
        if n == 0 {
            return Err(RegistryError::DeviceNotFound { id: patch.id });
        }

        let device = db.query_row(
            &format!("{DEVICE_SELECT} WHERE id = ?1"),
            rusqlite::params![patch.id],
            row_to_device,
        )?;
        Ok(device)
    }

    /// Delete by id; dependent commands go with it (ON DELETE CASCADE).
    #[instrument(skip(self))]
    pub fn delete(&self, id: i64) -> Result<()> {
        let db = self.db.lock().unwrap();
        let n = db.execute("DELETE FROM devices WHERE id = ?1", [id])?;
        if n == 0 {
            return Err(RegistryError::DeviceNotFound { id });
        }
        info!(device_id = id, "device deleted");
        Ok(())
    }

    /// Refresh `last_seen` to now — called on every poll and event.
    pub fn touch_last_seen(&self, id: i64) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE devices SET last_seen = ?1 WHERE id = ?2",
            rusqlite::params![now, id],
        )?;
        if n == 0 {
            return Err(RegistryError::DeviceNotFound { id });
        }
        debug!(device_id = id, "last_seen refreshed");
        Ok(())
    }
}

/// Reject regimes containing keys the evaluator could never match.
fn validate_regime(regime: &Regime) -> Result<()> {
    for key in regime.keys() {
        if !is_minute_key(key) {
            return Err(RegistryError::InvalidInput(format!(
                "regime key is not a valid \"HH:MM\" minute key: {key}"
            )));
        }
    }
    Ok(())
}
