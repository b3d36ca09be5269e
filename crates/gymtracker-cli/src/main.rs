//! CLI entry point for GymTracker.
//!
//! This binary provides the `gymtracker` command: account management, the
//! per-user entry log, and storage setup and maintenance.

mod account;
mod cli;
mod config;
mod entries;
mod helpers;
mod validation;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use gymtracker_store::{Database, FilePreferences, UserSession};
use tracing::{error, info, warn};

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::helpers::App;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(2);
        }
    };
    helpers::init_tracing(&config.logging.level);

    if let Err(e) = run(cli, config) {
        error!(error = %format!("{e:#}"), "command failed");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Setup => cmd_setup(config, &mut out),
        Commands::Status => cmd_status(&config, &cli.config, &mut out),
        Commands::Reset { yes } => cmd_reset(config, &mut out, yes),
        Commands::Signup {
            username,
            email,
            password,
            confirm,
        } => account::cmd_signup(
            &App::open(config)?,
            &mut out,
            &username,
            &email,
            &password,
            &confirm,
        ),
        Commands::Login { username, password } => {
            account::cmd_login(&App::open(config)?, &mut out, &username, &password)
        }
        Commands::Logout => account::cmd_logout(&App::open(config)?, &mut out),
        Commands::Whoami => account::cmd_whoami(&App::open(config)?, &mut out),
        Commands::Entries { action } => entries::cmd_entries(&App::open(config)?, &mut out, action),
        Commands::Calendar { month } => {
            entries::cmd_calendar(&App::open(config)?, &mut out, month.as_deref())
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommand: setup
// ---------------------------------------------------------------------------

fn cmd_setup(config: Config, out: &mut impl Write) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "  GymTracker Setup")?;
    writeln!(out, "  ================")?;
    writeln!(out)?;

    let data_dir = config.storage.data_dir.clone();
    if data_dir.exists() {
        writeln!(out, "  [=] Data directory already exists")?;
    } else {
        writeln!(out, "  [+] Created data directory")?;
    }

    let app = App::open(config)?;
    writeln!(
        out,
        "  [+] Database initialized at {}",
        app.config.database_path().display()
    )?;
    writeln!(out, "  [+] Password hashing self-test passed")?;
    writeln!(out, "  [=] {} account(s) registered", app.users.count()?)?;

    writeln!(out)?;
    writeln!(out, "  Setup complete! Run `gymtracker signup` to create an account.")?;
    writeln!(out)?;

    info!(data_dir = %data_dir.display(), "setup complete");
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: status
// ---------------------------------------------------------------------------

/// Report on storage without creating anything.
fn cmd_status(config: &Config, config_path: &Path, out: &mut impl Write) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "  GymTracker Status")?;
    writeln!(out, "  =================")?;
    writeln!(out)?;

    if config_path.exists() {
        writeln!(out, "  Config:           OK ({})", config_path.display())?;
    } else {
        writeln!(out, "  Config:           DEFAULTS (no {})", config_path.display())?;
    }

    let data_dir = &config.storage.data_dir;
    if data_dir.exists() {
        writeln!(out, "  Data directory:   OK ({})", data_dir.display())?;
    } else {
        writeln!(out, "  Data directory:   MISSING (run `gymtracker setup`)")?;
    }

    let db_path = config.database_path();
    if db_path.exists() {
        writeln!(out, "  Database:         OK ({})", db_path.display())?;
    } else {
        writeln!(out, "  Database:         NOT INITIALIZED (run `gymtracker setup`)")?;
    }

    let prefs = FilePreferences::open(config.prefs_dir(), &config.session.namespace)
        .context("failed to read session preferences")?;
    match UserSession::new(prefs).current_user()? {
        Some(user) => writeln!(out, "  Session:          {} (id {})", user.username, user.id)?,
        None => writeln!(out, "  Session:          not logged in")?,
    }

    writeln!(out)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: reset
// ---------------------------------------------------------------------------

/// Drop all accounts and entries, and log out.
fn cmd_reset(config: Config, out: &mut impl Write, confirmed: bool) -> Result<()> {
    if !confirmed {
        writeln!(
            out,
            "This deletes every account and entry. Re-run with --yes to confirm."
        )?;
        return Ok(());
    }

    let db_path = config.database_path();
    if db_path.exists() {
        let db = Database::open_and_migrate(&db_path)
            .with_context(|| format!("failed to open database {}", db_path.display()))?;
        db.reset().context("failed to reset database")?;
        warn!(path = %db_path.display(), "database reset");
    }

    let prefs = FilePreferences::open(config.prefs_dir(), &config.session.namespace)
        .context("failed to open session preferences")?;
    UserSession::new(prefs).logout()?;

    writeln!(out, "Database reset")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::helpers::tests::output;

    fn config_in(dir: &tempfile::TempDir) -> Config {
        Config {
            storage: StorageConfig {
                data_dir: dir.path().join("data"),
                ..StorageConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn setup_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let db_path = config.database_path();

        let mut out = Vec::new();
        cmd_setup(config, &mut out).unwrap();
        let text = output(out);

        assert!(db_path.exists());
        assert!(text.contains("[+] Created data directory"));
        assert!(text.contains("0 account(s) registered"));
    }

    #[test]
    fn status_does_not_create_storage() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let mut out = Vec::new();
        cmd_status(&config, &dir.path().join("missing.toml"), &mut out).unwrap();
        let text = output(out);

        assert!(text.contains("Data directory:   MISSING"));
        assert!(text.contains("NOT INITIALIZED"));
        assert!(text.contains("not logged in"));
        assert!(!config.storage.data_dir.exists());
    }

    #[test]
    fn status_shows_session() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        {
            let app = App::open(config.clone()).unwrap();
            app.users.register("alice", "a@x.com", "secret1").unwrap();
            let alice = app.users.authenticate("alice", "secret1").unwrap().unwrap();
            app.session.login(&alice).unwrap();
        }

        let mut out = Vec::new();
        cmd_status(&config, &dir.path().join("missing.toml"), &mut out).unwrap();
        assert!(output(out).contains("Session:          alice"));
    }

    #[test]
    fn reset_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        {
            let app = App::open(config.clone()).unwrap();
            app.users.register("alice", "a@x.com", "secret1").unwrap();
        }

        let mut out = Vec::new();
        cmd_reset(config.clone(), &mut out, false).unwrap();
        assert!(output(out).contains("--yes"));
        assert_eq!(App::open(config.clone()).unwrap().users.count().unwrap(), 1);

        let mut out = Vec::new();
        cmd_reset(config.clone(), &mut out, true).unwrap();
        assert_eq!(output(out), "Database reset\n");
        assert_eq!(App::open(config).unwrap().users.count().unwrap(), 0);
    }

    #[test]
    fn reset_logs_out() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        {
            let app = App::open(config.clone()).unwrap();
            app.users.register("alice", "a@x.com", "secret1").unwrap();
            let alice = app.users.authenticate("alice", "secret1").unwrap().unwrap();
            app.session.login(&alice).unwrap();
        }

        cmd_reset(config.clone(), &mut Vec::new(), true).unwrap();
        let app = App::open(config).unwrap();
        assert!(!app.session.is_logged_in().unwrap());
    }
}
