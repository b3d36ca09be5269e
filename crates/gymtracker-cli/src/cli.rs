//! CLI argument definitions for GymTracker.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

/// GymTracker -- goals, activities and diary notes on a calendar.
#[derive(Parser)]
#[command(
    name = "gymtracker",
    version,
    about = "GymTracker -- personal goal, activity and diary tracker",
    long_about = "Register an account, log in, and record dated goals, activities and \
                  diary notes, viewed one calendar day at a time."
)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory and initialize the database.
    Setup,

    /// Show storage paths and the current session.
    Status,

    /// Create a new account.
    Signup {
        /// Login name.
        username: String,
        /// Email address.
        email: String,
        /// Password.
        #[arg(long, short)]
        password: String,
        /// Password again, to confirm.
        #[arg(long, short)]
        confirm: String,
    },

    /// Log in and remember the session on this device.
    Login {
        /// Login name.
        username: String,
        /// Password.
        #[arg(long, short)]
        password: String,
    },

    /// Forget the logged-in user.
    Logout,

    /// Show the logged-in user.
    Whoami,

    /// Manage entries for the logged-in user.
    Entries {
        #[command(subcommand)]
        action: EntryAction,
    },

    /// Show which days of a month have entries.
    Calendar {
        /// Month as YYYY-MM (defaults to the current month).
        #[arg(long, short)]
        month: Option<String>,
    },

    /// Drop and recreate the database schema. All accounts and entries are lost.
    Reset {
        /// Confirm the destructive reset.
        #[arg(long)]
        yes: bool,
    },
}

/// Actions on entries.
#[derive(Subcommand)]
pub enum EntryAction {
    /// List entries for a day.
    List {
        /// Day as YYYY-MM-DD (defaults to today).
        #[arg(long, short)]
        date: Option<String>,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Add an entry.
    Add {
        /// goal, activity or diary.
        #[arg(long = "type", short = 't', default_value = "goal")]
        kind: String,
        /// Entry title.
        #[arg(long)]
        title: String,
        /// Optional description.
        #[arg(long)]
        description: Option<String>,
        /// Day as YYYY-MM-DD (defaults to today).
        #[arg(long, short)]
        date: Option<String>,
    },
    /// Show one entry.
    Show {
        /// Entry id.
        id: i64,
    },
    /// Change an entry. Omitted fields keep their current value.
    Edit {
        /// Entry id.
        id: i64,
        /// goal, activity or diary.
        #[arg(long = "type", short = 't')]
        kind: Option<String>,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New description (empty clears it).
        #[arg(long)]
        description: Option<String>,
        /// Move to another day (YYYY-MM-DD).
        #[arg(long, short)]
        date: Option<String>,
    },
    /// Delete an entry.
    Delete {
        /// Entry id.
        id: i64,
    },
}
