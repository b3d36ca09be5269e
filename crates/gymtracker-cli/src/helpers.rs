//! Shared helper functions used across CLI subcommands.
//!
//! Includes tracing initialization and the [`App`] context that opens the
//! stores every command works with.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use gymtracker_store::{
    Database, EntryStore, FilePreferences, SessionUser, UserSession, UserStore, password,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// App context
// ---------------------------------------------------------------------------

/// Everything a command needs: configuration, stores and the session.
pub struct App {
    pub config: Config,
    pub db: Database,
    pub users: UserStore,
    pub entries: EntryStore,
    pub session: UserSession<FilePreferences>,
}

impl App {
    /// Check the password hasher, then open the database and the session.
    ///
    /// A failing hasher self-test aborts startup: without it nobody can
    /// register or log in.
    pub fn open(config: Config) -> Result<Self> {
        password::self_test().context("password hashing is unavailable")?;

        std::fs::create_dir_all(&config.storage.data_dir).with_context(|| {
            format!(
                "failed to create data directory {}",
                config.storage.data_dir.display()
            )
        })?;

        let db_path = config.database_path();
        let db = Database::open(&db_path)
            .with_context(|| format!("failed to open database {}", db_path.display()))?;
        let schema = db
            .run_migrations()
            .with_context(|| format!("failed to prepare schema in {}", db_path.display()))?;
        info!(path = %db_path.display(), ?schema, "store initialized");

        let prefs = FilePreferences::open(config.prefs_dir(), &config.session.namespace)
            .context("failed to open session preferences")?;
        let session = UserSession::new(prefs);

        // No account from before survives a fresh or rebuilt schema, and
        // new accounts reuse the old ids.
        if schema.is_empty_start() && session.is_logged_in()? {
            warn!(?schema, "database was rebuilt, clearing the saved session");
            session.logout()?;
        }

        Ok(Self {
            users: UserStore::new(db.clone()),
            entries: EntryStore::new(db.clone()),
            session,
            db,
            config,
        })
    }

    /// The logged-in user, or `None` after telling the user to log in.
    ///
    /// The session must still match a stored account by id, username and
    /// email. Ids are reused once the database is reset, so an id alone
    /// may name a different account. A session that no longer matches is
    /// cleared.
    pub fn require_user(&self, out: &mut impl Write) -> Result<Option<SessionUser>> {
        let Some(user) = self.session.current_user()? else {
            writeln!(out, "Please login first")?;
            return Ok(None);
        };

        let matches = self
            .users
            .get(user.id)?
            .is_some_and(|stored| stored.username == user.username && stored.email == user.email);
        if !matches {
            warn!(user_id = user.id, "session does not match a stored account, clearing it");
            self.session.logout()?;
            writeln!(out, "Please login first")?;
            return Ok(None);
        }

        Ok(Some(user))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
