use std::str::FromStr;

use rusqlite::{Connection, Result};

use crate::types::{Command, CommandState};

/// Initialise the command queue schema in `conn`.
///
/// Assumes the registry schema (devices table) already exists — the
/// gateway runs registry migrations first. Idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS commands (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            date_time   INTEGER NOT NULL,   -- epoch seconds UTC
            device_id   INTEGER NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
            command     TEXT    NOT NULL,
            kwargs      TEXT    NOT NULL DEFAULT '{}',  -- opaque JSON object
            state       TEXT    NOT NULL DEFAULT 'pending',
            result_code INTEGER             -- NULL until completion
        );

        -- Hot path: UPDATE … WHERE device_id = ? AND state = 'pending'
        CREATE INDEX IF NOT EXISTS idx_commands_device_state
            ON commands (device_id, state);
        ",
    )?;
    Ok(())
}

/// Map a SELECT row (id, date_time, device_id, command, kwargs, state,
/// result_code) to a Command. Centralised so every query in this crate
/// stays consistent.
pub(crate) fn row_to_command(row: &rusqlite::Row<'_>) -> rusqlite::Result<Command> {
    let kwargs = serde_json::from_str(&row.get::<_, String>(4)?)
        .unwrap_or_else(|_| serde_json::json!({}));
    let state = CommandState::from_str(&row.get::<_, String>(5)?)
        .unwrap_or(CommandState::Pending);
    let date_time = chrono::DateTime::from_timestamp(row.get::<_, i64>(1)?, 0)
        .unwrap_or_default();
    Ok(Command {
        id: row.get(0)?,
        date_time,
        device_id: row.get(2)?,
        command: row.get(3)?,
        kwargs,
        state,
        result_code: row.get(6)?,
    })
}
