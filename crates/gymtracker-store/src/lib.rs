//! # gymtracker-store
//!
//! Storage engine for GymTracker.
//!
//! Provides SQLite-backed user accounts and dated entries, salted password
//! hashing, and a device-local login session. Everything is synchronous:
//! each call runs to completion on the calling thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  UserSession  (who is logged in)         │
//! │  PreferenceStore (JSON file / memory)    │
//! ├─────────────────────────────────────────┤
//! │  UserStore    (register / authenticate)  │
//! │  EntryStore   (entries by user + date)   │
//! │  password     (SHA-256, 16-byte salt)    │
//! ├─────────────────────────────────────────┤
//! │  Database (rusqlite WAL, foreign keys)   │
//! │  Schema   (single version, drop+create)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use gymtracker_store::{Database, FilePreferences, UserSession, UserStore};
//!
//! let db = Database::open_and_migrate("data/gymtracker.db")?;
//! let users = UserStore::new(db.clone());
//! users.register("alice", "a@x.com", "secret1")?;
//!
//! let session = UserSession::new(FilePreferences::open("data/prefs", "UserSession")?);
//! if let Some(user) = users.authenticate("alice", "secret1")? {
//!     session.login(&user)?;
//! }
//! ```

pub mod db;
pub mod entry_store;
pub mod error;
pub mod migration;
pub mod password;
pub mod prefs;
pub mod session;
pub mod user_store;

// ── re-exports ───────────────────────────────────────────────────────

pub use db::Database;
pub use entry_store::{Entry, EntryKind, EntryStore, NewEntry};
pub use error::{StoreError, StoreResult};
pub use migration::SchemaChange;
pub use prefs::{FilePreferences, MemoryPreferences, PreferenceStore};
pub use session::{SessionUser, UserSession};
pub use user_store::{User, UserStore};
