use rusqlite::{Connection, Result};

use crate::types::{Device, User};

/// Initialise the registry schema. Safe to call on every startup —
/// CREATE IF NOT EXISTS means it's idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    create_users_table(conn)?;
    create_devices_table(conn)?;
    Ok(())
}

fn create_users_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );",
    )
}

fn create_devices_table(conn: &Connection) -> Result<()> {
    // UNIQUE(user_id, name) enforces one device name per owner.
    // idx_devices_user speeds up the admin listing filter.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS devices (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            last_seen   TEXT NOT NULL,
            status      TEXT NOT NULL,
            regime      TEXT NOT NULL DEFAULT '{}',  -- JSON: \"HH:MM\" -> payload
            UNIQUE(user_id, name)
        );
        CREATE INDEX IF NOT EXISTS idx_devices_user
            ON devices (user_id);",
    )
}

/// Map a SELECT row (id, name, email, password, created_at) to a User.
/// Centralised here so every query in this crate stays consistent.
pub(crate) fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Map a SELECT row (id, name, user_id, last_seen, status, regime) to a Device.
pub(crate) fn row_to_device(row: &rusqlite::Row<'_>) -> rusqlite::Result<Device> {
    let regime = serde_json::from_str(&row.get::<_, String>(5)?).unwrap_or_default();
    Ok(Device {
        id: row.get(0)?,
        name: row.get(1)?,
        user_id: row.get(2)?,
        last_seen: row.get(3)?,
        status: row.get(4)?,
        regime,
    })
}
