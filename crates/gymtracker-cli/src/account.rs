//! Account subcommands: `signup`, `login`, `logout`, `whoami`.
//!
//! Input is validated before the store is touched. Store outcomes map to
//! one-line messages written to `out`.

use std::io::Write;

use anyhow::Result;
use tracing::info;

use crate::helpers::App;
use crate::validation;

/// `gymtracker signup`
pub fn cmd_signup(
    app: &App,
    out: &mut impl Write,
    username: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<()> {
    let form = match validation::signup(
        username,
        email,
        password,
        confirm,
        app.config.auth.min_password_length,
    ) {
        Ok(form) => form,
        Err(e) => {
            writeln!(out, "{e}")?;
            return Ok(());
        }
    };

    if app.users.register(&form.username, &form.email, &form.password)? {
        info!(username = %form.username, "account created");
        writeln!(out, "Registration successful! Please login.")?;
    } else {
        writeln!(out, "Username or email already exists")?;
    }
    Ok(())
}

/// `gymtracker login`
pub fn cmd_login(app: &App, out: &mut impl Write, username: &str, password: &str) -> Result<()> {
    let (username, password) = match validation::login(username, password) {
        Ok(fields) => fields,
        Err(e) => {
            writeln!(out, "{e}")?;
            return Ok(());
        }
    };

    match app.users.authenticate(username, password)? {
        Some(user) => {
            app.session.login(&user)?;
            writeln!(out, "Logged in as {}", user.username)?;
        }
        None => writeln!(out, "Invalid credentials")?,
    }
    Ok(())
}

/// `gymtracker logout`
pub fn cmd_logout(app: &App, out: &mut impl Write) -> Result<()> {
    let was_logged_in = app.session.is_logged_in()?;
    app.session.logout()?;
    if was_logged_in {
        writeln!(out, "Logged out")?;
    } else {
        writeln!(out, "Not logged in")?;
    }
    Ok(())
}

/// `gymtracker whoami`
pub fn cmd_whoami(app: &App, out: &mut impl Write) -> Result<()> {
    match app.session.current_user()? {
        Some(user) => writeln!(out, "{} <{}> (id {})", user.username, user.email, user.id)?,
        None => writeln!(out, "Not logged in")?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::tests::{output, temp_app};

    fn run(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        output(out)
    }

    #[test]
    fn signup_then_duplicate() {
        let (_dir, app) = temp_app();

        let first = run(|out| cmd_signup(&app, out, "alice", "a@x.com", "secret1", "secret1"));
        assert_eq!(first, "Registration successful! Please login.\n");

        let second = run(|out| cmd_signup(&app, out, "alice", "b@x.com", "secret2", "secret2"));
        assert_eq!(second, "Username or email already exists\n");
        assert_eq!(app.users.count().unwrap(), 1);
    }

    #[test]
    fn signup_validation_skips_the_store() {
        let (_dir, app) = temp_app();

        let msg = run(|out| cmd_signup(&app, out, "alice", "a@x.com", "secret1", "secret2"));
        assert_eq!(msg, "Passwords do not match\n");

        let msg = run(|out| cmd_signup(&app, out, "alice", "a@x.com", "abc", "abc"));
        assert_eq!(msg, "Password must be at least 6 characters\n");

        assert_eq!(app.users.count().unwrap(), 0);
    }

    #[test]
    fn login_whoami_logout() {
        let (_dir, app) = temp_app();
        app.users.register("alice", "a@x.com", "secret1").unwrap();

        assert_eq!(run(|out| cmd_login(&app, out, "alice", "wrong")), "Invalid credentials\n");
        assert!(!app.session.is_logged_in().unwrap());

        assert_eq!(
            run(|out| cmd_login(&app, out, "alice", "secret1")),
            "Logged in as alice\n"
        );
        assert!(run(|out| cmd_whoami(&app, out)).starts_with("alice <a@x.com>"));

        assert_eq!(run(|out| cmd_logout(&app, out)), "Logged out\n");
        assert_eq!(run(|out| cmd_whoami(&app, out)), "Not logged in\n");
    }

    #[test]
    fn login_requires_fields() {
        let (_dir, app) = temp_app();
        assert_eq!(run(|out| cmd_login(&app, out, "", "pw")), "Please fill all fields\n");
    }
}
