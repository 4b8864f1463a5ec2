use std::sync::Mutex;

use rusqlite::{Connection, ToSql};
use tracing::{info, instrument};

use crate::db::row_to_user;
use crate::error::{is_constraint_violation, RegistryError, Result};
use crate::types::{NewUser, User, UserFilter, UserPatch};

const USER_SELECT: &str = "SELECT id, name, email, password, created_at FROM users";

/// Thread-safe store for user accounts.
///
/// Wraps a single SQLite connection in a `Mutex` — sufficient for a
/// single-node deployment; swap in a pool if that ever changes.
pub struct UserStore {
    db: Mutex<Connection>,
}

impl UserStore {
    /// Wrap an already-open (and `init_db`-initialised) connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Equality-filtered listing; absent filter fields mean no constraint.
    pub fn query(&self, filter: &UserFilter) -> Result<Vec<User>> {
        let mut sql = format!("{USER_SELECT} WHERE 1=1");
        let mut params: Vec<&dyn ToSql> = Vec::new();
        if let Some(ref id) = filter.id {
            sql.push_str(" AND id = ?");
            params.push(id);
        }
        if let Some(ref name) = filter.name {
            sql.push_str(" AND name = ?");
            params.push(name);
        }
        if let Some(ref email) = filter.email {
            sql.push_str(" AND email = ?");
            params.push(email);
        }

        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map(&params[..], row_to_user)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Create a user. Duplicate email surfaces as `Conflict`.
    #[instrument(skip(self, new), fields(email = %new.email))]
    pub fn create(&self, new: &NewUser) -> Result<User> {
        if new.name.is_empty() || new.email.is_empty() || new.password.is_empty() {
            return Err(RegistryError::InvalidInput(
                "user creation requires name, email and password".into(),
            ));
        }

        let now = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO users (name, email, password, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![new.name, new.email, new.password, now],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                RegistryError::Conflict(format!("email already registered: {}", new.email))
            } else {
                e.into()
            }
        })?;

        let id = db.last_insert_rowid();
        info!(user_id = id, "user created");
        Ok(User {
            id,
            name: new.name.clone(),
            email: new.email.clone(),
            password: new.password.clone(),
            created_at: now,
        })
    }

    /// Update only the supplied fields. Returns the post-update record.
    #[instrument(skip(self, patch), fields(user_id = patch.id))]
    pub fn patch(&self, patch: &UserPatch) -> Result<User> {
        let mut sets = Vec::new();
        let mut params: Vec<&dyn ToSql> = Vec::new();
        if let Some(ref name) = patch.name {
            sets.push("name = ?");
            params.push(name);
        }
        if let Some(ref email) = patch.email {
            sets.push("email = ?");
            params.push(email);
        }
        if let Some(ref password) = patch.password {
            sets.push("password = ?");
            params.push(password);
        }
        if sets.is_empty() {
            return Err(RegistryError::InvalidInput(
                "patch must supply at least one field".into(),
            ));
        }
        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        params.push(&patch.id);

        let db = self.db.lock().unwrap();
        let n = db.execute(&sql, &params[..]).map_err(|e| {
            if is_constraint_violation(&e) {
                RegistryError::Conflict("email already registered".into())
            } else {
                RegistryError::from(e)
            }
        })?;
        if n == 0 {
            return Err(RegistryError::UserNotFound { id: patch.id });
        }

        let user = db.query_row(
            &format!("{USER_SELECT} WHERE id = ?1"),
            rusqlite::params![patch.id],
            row_to_user,
        )?;
        Ok(user)
    }

    /// Delete by id. `UserNotFound` if no row was removed.
    #[instrument(skip(self))]
    pub fn delete(&self, id: i64) -> Result<()> {
        let db = self.db.lock().unwrap();
        let n = db.execute("DELETE FROM users WHERE id = ?1", [id])?;
        if n == 0 {
            return Err(RegistryError::UserNotFound { id });
        }
        info!(user_id = id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;

    fn store() -> UserStore {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        UserStore::new(conn)
    }

    fn alice() -> NewUser {
        NewUser {
            name: "alice".into(),
            email: "alice@example.com".into(),
            password: "hunter2".into(),
        }
    }

    #[test]
    fn create_and_query_by_email() {
        let store = store();
        let created = store.create(&alice()).unwrap();
        assert!(created.id > 0);

        let found = store
            .query(&UserFilter {
                email: Some("alice@example.com".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "alice");
    }

    #[test]
    fn duplicate_email_is_conflict() {
        let store = store();
        store.create(&alice()).unwrap();
        let err = store.create(&alice()).unwrap_err();
        assert!(matches!(err, RegistryError::Conflict(_)));
    }

    #[test]
    fn empty_fields_rejected() {
        let store = store();
        let err = store
            .create(&NewUser {
                name: String::new(),
                email: "a@b".into(),
                password: "x".into(),
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidInput(_)));
    }

    #[test]
    fn patch_updates_only_supplied_fields() {
        let store = store();
        let user = store.create(&alice()).unwrap();
        let updated = store
            .patch(&UserPatch {
                id: user.id,
                name: Some("alice2".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.name, "alice2");
        assert_eq!(updated.email, "alice@example.com");
    }

    #[test]
    fn patch_unknown_id_is_not_found() {
        let store = store();
        let err = store
            .patch(&UserPatch {
                id: 404,
                name: Some("ghost".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::UserNotFound { id: 404 }));
    }

    #[test]
    fn delete_unknown_id_is_not_found() {
        let store = store();
        let err = store.delete(42).unwrap_err();
        assert!(matches!(err, RegistryError::UserNotFound { id: 42 }));
    }
}
