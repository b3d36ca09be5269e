//! Schema creation and destructive reset.
//!
//! The schema has a single version. It is recorded in a `_schema`
//! bookkeeping table. A database at any other version is not migrated in
//! place: every table is dropped and the schema is recreated from scratch.

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// The schema version this build of the store understands.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_DESCRIPTION: &str = "initial schema: users, entries";

/// Tables owned by the schema, in drop order (children first).
const TABLES: &[&str] = &["entries", "users"];

const CREATE_SQL: &str = r#"
    CREATE TABLE users (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        username      TEXT UNIQUE NOT NULL,
        email         TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL
    );

    CREATE TABLE entries (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id     INTEGER NOT NULL REFERENCES users(id),
        type        TEXT NOT NULL CHECK(type IN ('goal','activity','diary')),
        title       TEXT NOT NULL,
        description TEXT,
        date        TEXT NOT NULL
    );
    CREATE INDEX idx_entries_user_date ON entries(user_id, date);
"#;

// ── public API ───────────────────────────────────────────────────────

/// What [`run_all`] did to the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaChange {
    /// Already at [`SCHEMA_VERSION`]; existing rows kept.
    Unchanged,
    /// Fresh database; tables created.
    Created,
    /// Version mismatch; every table dropped and recreated.
    Recreated,
}

impl SchemaChange {
    /// `true` when no row from before this call survives.
    pub fn is_empty_start(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Bring the schema to [`SCHEMA_VERSION`].
///
/// A fresh database gets the schema created. A database already at the
/// current version is left alone. Anything else is dropped and recreated.
pub fn run_all(conn: &Connection) -> StoreResult<SchemaChange> {
    ensure_schema_table(conn)?;

    let current = current_version(conn)?;
    if current == SCHEMA_VERSION {
        debug!(version = current, "database schema is up to date");
        return Ok(SchemaChange::Unchanged);
    }

    let change = if current == 0 {
        info!(version = SCHEMA_VERSION, "creating database schema");
        SchemaChange::Created
    } else {
        warn!(
            found = current,
            expected = SCHEMA_VERSION,
            "schema version mismatch, dropping all tables"
        );
        SchemaChange::Recreated
    };

    recreate(conn)?;
    Ok(change)
}

/// Drop every table and recreate the schema at [`SCHEMA_VERSION`].
pub fn reset(conn: &Connection) -> StoreResult<()> {
    ensure_schema_table(conn)?;
    warn!("resetting database schema, all data will be lost");
    recreate(conn)
}

/// Return the recorded schema version, or 0 if none.
pub fn current_version(conn: &Connection) -> StoreResult<u32> {
    let version: u32 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM _schema", [], |row| {
            row.get(0)
        })
        .map_err(|e| StoreError::Schema {
            version: 0,
            message: format!("failed to read current version: {e}"),
        })?;
    Ok(version)
}

// ── internals ────────────────────────────────────────────────────────

fn ensure_schema_table(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _schema (
            version     INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at  INTEGER NOT NULL
        );",
    )
    .map_err(|e| StoreError::Schema {
        version: 0,
        message: format!("failed to create _schema table: {e}"),
    })?;
    Ok(())
}

/// Drop and create inside one transaction so a failure leaves the old
/// tables in place.
fn recreate(conn: &Connection) -> StoreResult<()> {
    // `conn.transaction()` needs `&mut Connection`, so manage it by hand.
    conn.execute_batch("BEGIN IMMEDIATE;")
        .map_err(|e| schema_error(format!("failed to begin transaction: {e}")))?;

    let result = (|| -> StoreResult<()> {
        for table in TABLES {
            conn.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))
                .map_err(|e| schema_error(format!("failed to drop {table}: {e}")))?;
        }
        conn.execute_batch("DELETE FROM _schema;")
            .map_err(|e| schema_error(format!("failed to clear _schema: {e}")))?;

        conn.execute_batch(CREATE_SQL)
            .map_err(|e| schema_error(format!("SQL execution failed: {e}")))?;

        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO _schema (version, description, applied_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![SCHEMA_VERSION, SCHEMA_DESCRIPTION, now],
        )
        .map_err(|e| schema_error(format!("failed to record version: {e}")))?;

        Ok(())
    })();

    match &result {
        Ok(()) => {
            conn.execute_batch("COMMIT;")
                .map_err(|e| schema_error(format!("failed to commit: {e}")))?;
            info!(version = SCHEMA_VERSION, "database schema ready");
        }
        Err(err) => {
            warn!(%err, "schema creation failed, rolling back");
            let _ = conn.execute_batch("ROLLBACK;");
        }
    }

    result
}

fn schema_error(message: String) -> StoreError {
    StoreError::Schema {
        version: SCHEMA_VERSION,
        message,
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        conn
    }

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master WHERE type='table' \
                 AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn run_all_on_fresh_db() {
        let conn = setup_conn();
        assert_eq!(run_all(&conn).unwrap(), SchemaChange::Created);

        assert_eq!(current_version(&conn).unwrap(), SCHEMA_VERSION);
        let tables = table_names(&conn);
        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"entries".to_string()));
    }

    #[test]
    fn run_all_is_idempotent_and_keeps_data() {
        let conn = setup_conn();
        run_all(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (username, email, password_hash) VALUES ('a', 'a@x.com', 'h')",
            [],
        )
        .unwrap();

        assert_eq!(run_all(&conn).unwrap(), SchemaChange::Unchanged);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn version_mismatch_drops_and_recreates() {
        let conn = setup_conn();
        run_all(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (username, email, password_hash) VALUES ('a', 'a@x.com', 'h')",
            [],
        )
        .unwrap();
        conn.execute("UPDATE _schema SET version = 99", []).unwrap();

        let change = run_all(&conn).unwrap();
        assert_eq!(change, SchemaChange::Recreated);
        assert!(change.is_empty_start());

        assert_eq!(current_version(&conn).unwrap(), SCHEMA_VERSION);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn reset_clears_rows() {
        let conn = setup_conn();
        run_all(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (username, email, password_hash) VALUES ('a', 'a@x.com', 'h')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO entries (user_id, type, title, date) VALUES (1, 'goal', 't', '2024-03-01')",
            [],
        )
        .unwrap();

        reset(&conn).unwrap();

        let entries: i64 = conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(entries, 0);
        assert_eq!(current_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn entry_type_check_constraint() {
        let conn = setup_conn();
        run_all(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (username, email, password_hash) VALUES ('a', 'a@x.com', 'h')",
            [],
        )
        .unwrap();

        let bad = conn.execute(
            "INSERT INTO entries (user_id, type, title, date) VALUES (1, 'workout', 't', '2024-03-01')",
            [],
        );
        assert!(bad.is_err());
    }

    #[test]
    fn entry_requires_existing_user() {
        let conn = setup_conn();
        run_all(&conn).unwrap();

        let orphan = conn.execute(
            "INSERT INTO entries (user_id, type, title, date) VALUES (42, 'goal', 't', '2024-03-01')",
            [],
        );
        assert!(orphan.is_err());
    }
}
