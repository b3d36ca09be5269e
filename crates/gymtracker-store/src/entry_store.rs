//! Dated goal / activity / diary entries.
//!
//! Entries belong to exactly one user (enforced by a foreign key) and are
//! looked up per user and calendar day. Dates are stored as `YYYY-MM-DD`
//! text so that string order is date order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// Storage format for [`Entry::date`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// What an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Something the user wants to achieve.
    Goal,
    /// Something the user did.
    Activity,
    /// A free-form note for the day.
    Diary,
}

impl EntryKind {
    /// All kinds, in display order.
    pub const ALL: [EntryKind; 3] = [Self::Goal, Self::Activity, Self::Diary];

    /// The string stored in SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::Activity => "activity",
            Self::Diary => "diary",
        }
    }

    /// Parse the stored string, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "goal" => Some(Self::Goal),
            "activity" => Some(Self::Activity),
            "diary" => Some(Self::Diary),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Row id assigned by the store.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Goal, activity or diary.
    pub kind: EntryKind,
    /// Short required title.
    pub title: String,
    /// Optional longer text.
    pub description: Option<String>,
    /// Calendar day the entry belongs to.
    pub date: NaiveDate,
}

/// Fields for an entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub user_id: i64,
    pub kind: EntryKind,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
}

impl NewEntry {
    /// Attach the id the store assigned.
    pub fn with_id(self, id: i64) -> Entry {
        Entry {
            id,
            user_id: self.user_id,
            kind: self.kind,
            title: self.title,
            description: self.description,
            date: self.date,
        }
    }
}

/// Parse a `YYYY-MM-DD` string into a date.
pub fn parse_date(s: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| StoreError::InvalidArgument(format!("invalid date {s:?}: {e}")))
}

/// Format a date the way it is stored.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// ═══════════════════════════════════════════════════════════════════════
//  EntryStore
// ═══════════════════════════════════════════════════════════════════════

/// CRUD on the `entries` table.
#[derive(Clone)]
pub struct EntryStore {
    db: Database,
}

impl EntryStore {
    /// Create a new entry store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert an entry and return its new id.
    ///
    /// Fails with a storage error if `user_id` does not reference a user.
    #[instrument(skip(self, entry), fields(user_id = entry.user_id, date = %entry.date))]
    pub fn add(&self, entry: &NewEntry) -> StoreResult<i64> {
        let date = format_date(entry.date);
        self.db.execute(|conn| {
            conn.execute(
                "INSERT INTO entries (user_id, type, title, description, date) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    entry.user_id,
                    entry.kind.as_str(),
                    entry.title,
                    entry.description,
                    date,
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!(entry_id = id, kind = %entry.kind, "entry added");
            Ok(id)
        })
    }

    /// Fetch a single entry by id, returning `None` if not found.
    #[instrument(skip(self))]
    pub fn get(&self, id: i64) -> StoreResult<Option<Entry>> {
        self.db.execute(|conn| {
            let result = conn.query_row(
                "SELECT id, user_id, type, title, description, date \
                 FROM entries WHERE id = ?1",
                rusqlite::params![id],
                EntryRow::from_row,
            );
            match result {
                Ok(row) => row.into_entry().map(Some),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(StoreError::Sqlite(e)),
            }
        })
    }

    /// All entries of `user_id` on `date`, in insertion order.
    #[instrument(skip(self))]
    pub fn list_for_date(&self, user_id: i64, date: NaiveDate) -> StoreResult<Vec<Entry>> {
        let date = format_date(date);
        self.db.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, type, title, description, date \
                 FROM entries WHERE user_id = ?1 AND date = ?2 ORDER BY id ASC",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, date], EntryRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter().map(EntryRow::into_entry).collect()
        })
    }

    /// Overwrite every field of the entry with `entry.id`.
    ///
    /// Returns `true` iff exactly one row matched. An unknown id returns
    /// `false` and creates nothing.
    #[instrument(skip(self, entry), fields(entry_id = entry.id))]
    pub fn update(&self, entry: &Entry) -> StoreResult<bool> {
        let date = format_date(entry.date);
        self.db.execute(|conn| {
            let updated = conn.execute(
                "UPDATE entries SET user_id = ?2, type = ?3, title = ?4, description = ?5, date = ?6 \
                 WHERE id = ?1",
                rusqlite::params![
                    entry.id,
                    entry.user_id,
                    entry.kind.as_str(),
                    entry.title,
                    entry.description,
                    date,
                ],
            )?;
            debug!(updated, "entry update");
            Ok(updated == 1)
        })
    }

    /// Delete an entry, returning the number of rows removed (0 or 1).
    #[instrument(skip(self))]
    pub fn delete(&self, id: i64) -> StoreResult<usize> {
        self.db.execute(|conn| {
            let deleted = conn.execute("DELETE FROM entries WHERE id = ?1", rusqlite::params![id])?;
            debug!(deleted, "entry delete");
            Ok(deleted)
        })
    }

    /// Total number of entries owned by `user_id`.
    pub fn count_for_user(&self, user_id: i64) -> StoreResult<i64> {
        self.db.execute(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM entries WHERE user_id = ?1",
                rusqlite::params![user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Days in `from..=to` on which `user_id` has entries, with the count
    /// per day, ordered by date.
    #[instrument(skip(self))]
    pub fn dates_with_entries(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<(NaiveDate, i64)>> {
        let (from, to) = (format_date(from), format_date(to));
        self.db.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT date, COUNT(*) FROM entries \
                 WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3 \
                 GROUP BY date ORDER BY date ASC",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, from, to], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(date, count)| -> StoreResult<(NaiveDate, i64)> {
                    Ok((parse_date(&date)?, count))
                })
                .collect()
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Internal row mapping
// ═══════════════════════════════════════════════════════════════════════

/// Raw `entries` row before kind and date parsing.
struct EntryRow {
    id: i64,
    user_id: i64,
    kind: String,
    title: String,
    description: Option<String>,
    date: String,
}

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            kind: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            date: row.get(5)?,
        })
    }

    fn into_entry(self) -> StoreResult<Entry> {
        let kind = EntryKind::parse(&self.kind).ok_or_else(|| {
            StoreError::InvalidArgument(format!("unknown entry type: {}", self.kind))
        })?;
        Ok(Entry {
            id: self.id,
            user_id: self.user_id,
            kind,
            title: self.title,
            description: self.description,
            date: parse_date(&self.date)?,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
