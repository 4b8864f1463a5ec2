use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{Connection, ToSql};
use tracing::{info, instrument};

use crate::db::row_to_command;
use crate::error::{QueueError, Result};
use crate::types::{Command, CommandFilter, CommandPatch, CommandState};

const COMMAND_SELECT: &str =
    "SELECT id, date_time, device_id, command, kwargs, state, result_code FROM commands";

/// Thread-safe command queue.
///
/// Exclusively owns `Command` state transitions. The scheduler only ever
/// creates commands through [`CommandQueue::enqueue`]; devices move them
/// through claim and completion. Every operation re-reads the store — no
/// command state is cached across calls.
pub struct CommandQueue {
    db: Mutex<Connection>,
}

impl CommandQueue {
    /// Wrap an already-open (and `init_db`-initialised) connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Create a Pending command for `device_id` stamped with the current
    /// time. `DeviceNotFound` when the device does not exist.
    #[instrument(skip(self, kwargs))]
    pub fn enqueue(
        &self,
        device_id: i64,
        opcode: &str,
        kwargs: serde_json::Value,
    ) -> Result<Command> {
        let db = self.db.lock().unwrap();
        let device_exists: bool = db.query_row(
            "SELECT EXISTS(SELECT 1 FROM devices WHERE id = ?1)",
            rusqlite::params![device_id],
            |row| row.get(0),
        )?;
        if !device_exists {
            return Err(QueueError::DeviceNotFound { id: device_id });
        }

        let now = Utc::now();
        let kwargs_json = kwargs.to_string();
        db.execute(
            "INSERT INTO commands (date_time, device_id, command, kwargs, state)
             VALUES (?1, ?2, ?3, ?4, 'pending')",
            rusqlite::params![now.timestamp(), device_id, opcode, kwargs_json],
        )?;

        let id = db.last_insert_rowid();
        info!(command_id = id, device_id, opcode, "command enqueued");
        Ok(Command {
            id,
            // Truncate to whole seconds, matching what was stored.
            date_time: chrono::DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now),
            device_id,
            command: opcode.to_string(),
            kwargs,
            state: CommandState::Pending,
            result_code: None,
        })
    }

    /// Atomically claim every Pending command for `device_id`.
    ///
    /// The compare-and-set lives in the WHERE clause: a single conditional
    /// UPDATE transitions matching rows to Dispatched and RETURNING hands
    /// back exactly the rows this call flipped. Two concurrent claims for
    /// the same device therefore partition the pending set — no command is
    /// returned twice, none is lost. Results are sorted ascending by
    /// `date_time` to preserve issuance order (RETURNING order is
    /// unspecified).
    #[instrument(skip(self))]
    pub fn claim_pending(&self, device_id: i64) -> Result<Vec<Command>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "UPDATE commands SET state = 'dispatched'
             WHERE device_id = ?1 AND state = 'pending'
             RETURNING id, date_time, device_id, command, kwargs, state, result_code",
        )?;
        let mut claimed: Vec<Command> = stmt
            .query_map(rusqlite::params![device_id], row_to_command)?
            .filter_map(|r| r.ok())
            .collect();
        claimed.sort_by_key(|c| (c.date_time, c.id));

        if !claimed.is_empty() {
            info!(device_id, count = claimed.len(), "commands claimed");
        }
        Ok(claimed)
    }

    /// Record the device-reported outcome for a command.
    ///
    /// Permissive by contract: the prior state is not validated, so a
    /// completion report for a command that was never claimed is accepted.
    /// The code is stored verbatim.
    #[instrument(skip(self))]
    pub fn report_completion(&self, command_id: i64, code: i64) -> Result<()> {
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE commands SET state = 'completed', result_code = ?2 WHERE id = ?1",
            rusqlite::params![command_id, code],
        )?;
        if n == 0 {
            return Err(QueueError::CommandNotFound { id: command_id });
        }
        info!(command_id, code, "command completed");
        Ok(())
    }

    /// Equality-filtered listing; absent filter fields mean no constraint.
    pub fn query(&self, filter: &CommandFilter) -> Result<Vec<Command>> {
        let mut sql = format!("{COMMAND_SELECT} WHERE 1=1");
        let mut params: Vec<&dyn ToSql> = Vec::new();
        if let Some(ref id) = filter.id {
            sql.push_str(" AND id = ?");
            params.push(id);
        }
        if let Some(ref device_id) = filter.device_id {
            sql.push_str(" AND device_id = ?");
            params.push(device_id);
        }
        if let Some(ref command) = filter.command {
            sql.push_str(" AND command = ?");
            params.push(command);
        }
        if let Some(ref date_time) = filter.date_time {
            sql.push_str(" AND date_time = ?");
            params.push(date_time);
        }
        // The wire integer folds lifecycle and result code together;
        // unfold it here so 0/1 match state and anything else matches a
        // completed command with that exact code.
        match filter.status {
            Some(0) => sql.push_str(" AND state = 'pending'"),
            Some(1) => sql.push_str(" AND state = 'dispatched'"),
            Some(ref code) => {
                sql.push_str(" AND state = 'completed' AND result_code = ?");
                params.push(code);
            }
            None => {}
        }

        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map(&params[..], row_to_command)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Delete by id. `CommandNotFound` if no row was removed.
    #[instrument(skip(self))]
    pub fn remove(&self, command_id: i64) -> Result<()> {
        let db = self.db.lock().unwrap();
        let n = db.execute("DELETE FROM commands WHERE id = ?1", [command_id])?;
        if n == 0 {
            return Err(QueueError::CommandNotFound { id: command_id });
        }
        info!(command_id, "command removed");
        Ok(())
    }

    /// Partial admin update. `device_id` is immutable and rejected here;
    /// a supplied `status` integer is unfolded into state/result_code.
    #[instrument(skip(self, patch), fields(command_id = patch.id))]
    pub fn patch(&self, patch: &CommandPatch) -> Result<Command> {
        if patch.device_id.is_some() {
            return Err(QueueError::InvalidInput(
                "device_id is immutable after creation".into(),
            ));
        }

        let kwargs_json = patch.kwargs.as_ref().map(ToString::to_string);
        let (state_str, result_code) = match patch.status {
            Some(0) => (Some("pending"), None),
            Some(1) => (Some("dispatched"), None),
            Some(code) => (Some("completed"), Some(code)),
            None => (None, None),
        };

        let mut sets = Vec::new();
        let mut params: Vec<&dyn ToSql> = Vec::new();
        if let Some(ref command) = patch.command {
            sets.push("command = ?");
            params.push(command);
        }
        if let Some(ref json) = kwargs_json {
            sets.push("kwargs = ?");
            params.push(json);
        }
        if let Some(ref state) = state_str {
            sets.push("state = ?");
            params.push(state);
            sets.push("result_code = ?");
            params.push(&result_code);
        }
        if sets.is_empty() {
            return Err(QueueError::InvalidInput(
                "patch must supply at least one field".into(),
            ));
        }
        let sql = format!("UPDATE commands SET {} WHERE id = ?", sets.join(", "));
        params.push(&patch.id);

        let db = self.db.lock().unwrap();
        let n = db.execute(&sql, &params[..])?;
        if n == 0 {
            return Err(QueueError::CommandNotFound { id: patch.id });
        }

        let command = db.query_row(
            &format!("{COMMAND_SELECT} WHERE id = ?1"),
            rusqlite::params![patch.id],
            row_to_command,
        )?;
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::init_db;

    /// Fresh in-memory DB with the full schema and one device (id 1)
    /// owned by one user (id 1).
    fn queue_with_device() -> CommandQueue {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        fleetd_registry::db::init_db(&conn).unwrap();
        init_db(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (name, email, password, created_at)
             VALUES ('u', 'u@example.com', 'pw', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO devices (name, user_id, last_seen, status, regime)
             VALUES ('d', 1, '2026-01-01T00:00:00Z', 'online', '{}')",
            [],
        )
        .unwrap();
        CommandQueue::new(conn)
    }

    #[test]
    fn enqueue_unknown_device_is_not_found() {
        let queue = queue_with_device();
        let err = queue.enqueue(99, "turn_on", serde_json::json!({})).unwrap_err();
        assert!(matches!(err, QueueError::DeviceNotFound { id: 99 }));
    }

    #[test]
    fn claim_flips_pending_to_dispatched() {
        let queue = queue_with_device();
        let a = queue.enqueue(1, "turn_on", serde_json::json!({})).unwrap();
        let b = queue
            .enqueue(1, "set_level", serde_json::json!({"level": 3}))
            .unwrap();

        let claimed = queue.claim_pending(1).unwrap();
        assert_eq!(
            claimed.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![a.id, b.id]
        );
        assert!(claimed.iter().all(|c| c.state == CommandState::Dispatched));

        // Nothing left to claim, and nothing is pending any more.
        assert!(queue.claim_pending(1).unwrap().is_empty());
        let pending = queue
            .query(&CommandFilter {
                device_id: Some(1),
                status: Some(0),
                ..Default::default()
            })
            .unwrap();
        assert!(pending.is_empty());
    }

    #[test]
    fn concurrent_claims_partition_the_pending_set() {
        let queue = Arc::new(queue_with_device());
        let total = 12;
        for _ in 0..total {
            queue.enqueue(1, "turn_on", serde_json::json!({})).unwrap();
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || queue.claim_pending(1).unwrap())
            })
            .collect();

        let mut seen = Vec::new();
        for h in handles {
            seen.extend(h.join().unwrap().into_iter().map(|c| c.id));
        }
        seen.sort_unstable();
        let before_dedup = seen.len();
        seen.dedup();
        assert_eq!(seen.len(), before_dedup, "a command was claimed twice");
        assert_eq!(seen.len(), total, "a command was lost");
    }

    #[test]
    fn completion_is_permissive_and_verbatim() {
        let queue = queue_with_device();
        let cmd = queue.enqueue(1, "turn_on", serde_json::json!({})).unwrap();

        // Never claimed, completion still accepted.
        queue.report_completion(cmd.id, 7).unwrap();
        let got = queue
            .query(&CommandFilter {
                id: Some(cmd.id),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(got[0].state, CommandState::Completed);
        assert_eq!(got[0].result_code, Some(7));
        assert_eq!(got[0].status_code(), 7);

        // Reporting again overwrites unconditionally.
        queue.report_completion(cmd.id, 3).unwrap();
        let got = queue
            .query(&CommandFilter {
                status: Some(3),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn completion_unknown_id_is_not_found() {
        let queue = queue_with_device();
        let err = queue.report_completion(404, 2).unwrap_err();
        assert!(matches!(err, QueueError::CommandNotFound { id: 404 }));
    }

    #[test]
    fn query_filters_compose() {
        let queue = queue_with_device();
        queue.enqueue(1, "turn_on", serde_json::json!({})).unwrap();
        queue.enqueue(1, "turn_off", serde_json::json!({})).unwrap();

        let on = queue
            .query(&CommandFilter {
                device_id: Some(1),
                command: Some("turn_on".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(on.len(), 1);

        let dispatched = queue
            .query(&CommandFilter {
                status: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert!(dispatched.is_empty());
    }

    #[test]
    fn remove_unknown_id_is_not_found() {
        let queue = queue_with_device();
        let err = queue.remove(5).unwrap_err();
        assert!(matches!(err, QueueError::CommandNotFound { id: 5 }));
    }

    #[test]
    fn patch_rejects_device_reassignment() {
        let queue = queue_with_device();
        let cmd = queue.enqueue(1, "turn_on", serde_json::json!({})).unwrap();
        let err = queue
            .patch(&CommandPatch {
                id: cmd.id,
                device_id: Some(2),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, QueueError::InvalidInput(_)));
    }

    #[test]
    fn patch_unfolds_wire_status() {
        let queue = queue_with_device();
        let cmd = queue.enqueue(1, "turn_on", serde_json::json!({})).unwrap();
        let updated = queue
            .patch(&CommandPatch {
                id: cmd.id,
                status: Some(9),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.state, CommandState::Completed);
        assert_eq!(updated.result_code, Some(9));
    }

    #[test]
    fn device_delete_cascades_to_commands() {
        let queue = queue_with_device();
        let cmd = queue.enqueue(1, "turn_on", serde_json::json!({})).unwrap();
        {
            let db = queue.db.lock().unwrap();
            db.execute("DELETE FROM devices WHERE id = 1", []).unwrap();
        }
        let err = queue.remove(cmd.id).unwrap_err();
        assert!(matches!(err, QueueError::CommandNotFound { .. }));
    }
}
