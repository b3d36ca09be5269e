//! User accounts and login.
//!
//! Accounts are created once at registration and never modified. Username
//! and email uniqueness is enforced by `UNIQUE` constraints in SQLite, so
//! registration needs no separate existence check.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::password;

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// A registered user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Row id assigned by the store.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// `hex(salt):hex(digest)` as produced by [`password::hash`].
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

// ═══════════════════════════════════════════════════════════════════════
//  UserStore
// ═══════════════════════════════════════════════════════════════════════

/// Registration and authentication against the `users` table.
#[derive(Clone)]
pub struct UserStore {
    db: Database,
}

impl UserStore {
    /// Create a new user store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a new account.
    ///
    /// Returns `Ok(false)` without writing anything when the username or the
    /// email is already taken, `Ok(true)` once the row is inserted.
    #[instrument(skip(self, password))]
    pub fn register(&self, username: &str, email: &str, password: &str) -> StoreResult<bool> {
        let password_hash = password::hash(password)?;

        self.db.execute(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
                rusqlite::params![username, email, password_hash],
            );

            match inserted {
                Ok(_) => {
                    debug!(user_id = conn.last_insert_rowid(), username, "user registered");
                    Ok(true)
                }
                Err(rusqlite::Error::SqliteFailure(ref err, _))
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    debug!(username, "username or email already taken");
                    Ok(false)
                }
                Err(e) => Err(StoreError::Sqlite(e)),
            }
        })
    }

    /// Check a username and password.
    ///
    /// Returns the full user on success. An unknown username and a wrong
    /// password both yield `None`.
    #[instrument(skip(self, password))]
    pub fn authenticate(&self, username: &str, password: &str) -> StoreResult<Option<User>> {
        let Some(user) = self.get_by_username(username)? else {
            debug!(username, "login rejected");
            return Ok(None);
        };

        if password::verify(password, &user.password_hash) {
            debug!(user_id = user.id, "login accepted");
            Ok(Some(user))
        } else {
            debug!(username, "login rejected");
            Ok(None)
        }
    }

    /// Fetch a user by id, returning `None` if not found.
    #[instrument(skip(self))]
    pub fn get(&self, id: i64) -> StoreResult<Option<User>> {
        self.db.execute(|conn| {
            let result = conn.query_row(
                "SELECT id, username, email, password_hash FROM users WHERE id = ?1",
                rusqlite::params![id],
                UserRow::from_row,
            );
            match result {
                Ok(row) => Ok(Some(row.into_user())),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(StoreError::Sqlite(e)),
            }
        })
    }

    /// Fetch a user by username, returning `None` if not found.
    #[instrument(skip(self))]
    pub fn get_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.db.execute(|conn| {
            let result = conn.query_row(
                "SELECT id, username, email, password_hash FROM users WHERE username = ?1",
                rusqlite::params![username],
                UserRow::from_row,
            );
            match result {
                Ok(row) => Ok(Some(row.into_user())),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(StoreError::Sqlite(e)),
            }
        })
    }

    /// Return the total number of users.
    pub fn count(&self) -> StoreResult<i64> {
        self.db.execute(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(count)
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Internal row mapping
// ═══════════════════════════════════════════════════════════════════════

/// Raw `users` row, columns in `SELECT id, username, email, password_hash` order.
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
}

impl UserRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
        })
    }

    fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> UserStore {
        UserStore::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn register_and_authenticate() {
        let store = setup();
        assert!(store.register("alice", "a@x.com", "secret1").unwrap());

        let user = store.authenticate("alice", "secret1").unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "a@x.com");
        assert!(user.id > 0);
    }

    #[test]
    fn duplicate_username_rejected() {
        let store = setup();
        assert!(store.register("alice", "a@x.com", "secret1").unwrap());
        assert!(!store.register("alice", "b@x.com", "secret2").unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn duplicate_email_rejected() {
        let store = setup();
        assert!(store.register("alice", "a@x.com", "secret1").unwrap());
        assert!(!store.register("bob", "a@x.com", "secret2").unwrap());
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.get_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn wrong_password_and_unknown_user_look_the_same() {
        let store = setup();
        store.register("alice", "a@x.com", "secret1").unwrap();

        assert!(store.authenticate("alice", "wrong").unwrap().is_none());
        assert!(store.authenticate("nobody", "secret1").unwrap().is_none());
    }

    #[test]
    fn password_is_not_stored_in_plaintext() {
        let store = setup();
        store.register("alice", "a@x.com", "secret1").unwrap();

        let user = store.get_by_username("alice").unwrap().unwrap();
        assert_ne!(user.password_hash, "secret1");
        assert!(!user.password_hash.contains("secret1"));
        assert!(password::verify("secret1", &user.password_hash));
    }

    #[test]
    fn get_by_id() {
        let store = setup();
        store.register("alice", "a@x.com", "secret1").unwrap();
        let alice = store.get_by_username("alice").unwrap().unwrap();

        assert_eq!(store.get(alice.id).unwrap(), Some(alice));
        assert!(store.get(9999).unwrap().is_none());
    }

    #[test]
    fn ids_are_distinct() {
        let store = setup();
        store.register("alice", "a@x.com", "secret1").unwrap();
        store.register("bob", "b@x.com", "secret2").unwrap();

        let alice = store.get_by_username("alice").unwrap().unwrap();
        let bob = store.get_by_username("bob").unwrap().unwrap();
        assert_ne!(alice.id, bob.id);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn serialized_user_omits_hash() {
        let store = setup();
        store.register("alice", "a@x.com", "secret1").unwrap();
        let user = store.get_by_username("alice").unwrap().unwrap();

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }
}
