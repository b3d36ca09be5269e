//! Entry subcommands and the month calendar.
//!
//! Every command here acts for the logged-in user. Entries owned by
//! someone else are reported exactly like missing ones.

use std::io::Write;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use gymtracker_store::{Entry, NewEntry, SessionUser};
use tracing::info;

use crate::cli::EntryAction;
use crate::helpers::{self, App};
use crate::validation::{self, ValidationError};

/// Dispatch `gymtracker entries <action>`.
pub fn cmd_entries(app: &App, out: &mut impl Write, action: EntryAction) -> Result<()> {
    let Some(user) = app.require_user(out)? else {
        return Ok(());
    };

    let result = match action {
        EntryAction::List { date, json } => list(app, out, &user, date.as_deref(), json),
        EntryAction::Add {
            kind,
            title,
            description,
            date,
        } => add(
            app,
            out,
            &user,
            &kind,
            &title,
            description.as_deref(),
            date.as_deref(),
        ),
        EntryAction::Show { id } => show(app, out, &user, id),
        EntryAction::Edit {
            id,
            kind,
            title,
            description,
            date,
        } => edit(
            app,
            out,
            &user,
            id,
            EntryChanges {
                kind: kind.as_deref(),
                title: title.as_deref(),
                description: description.as_deref(),
                date: date.as_deref(),
            },
        ),
        EntryAction::Delete { id } => delete(app, out, &user, id),
    };

    report_validation(out, result)
}

/// `gymtracker calendar`
pub fn cmd_calendar(app: &App, out: &mut impl Write, month: Option<&str>) -> Result<()> {
    let Some(user) = app.require_user(out)? else {
        return Ok(());
    };
    let result = calendar(app, out, &user, month);
    report_validation(out, result)
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Show a rejected input to the user; any other error propagates.
fn report_validation(out: &mut impl Write, result: Result<()>) -> Result<()> {
    match result {
        Err(e) => match e.downcast_ref::<ValidationError>() {
            Some(invalid) => {
                writeln!(out, "{invalid}")?;
                Ok(())
            }
            None => Err(e),
        },
        ok => ok,
    }
}

fn day_or_today(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(raw) => Ok(validation::date(raw)?),
        None => Ok(helpers::today()),
    }
}

/// Fetch an entry only if `user` owns it.
fn owned_entry(app: &App, user: &SessionUser, id: i64) -> Result<Option<Entry>> {
    Ok(app.entries.get(id)?.filter(|e| e.user_id == user.id))
}

fn list(
    app: &App,
    out: &mut impl Write,
    user: &SessionUser,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let date = day_or_today(date)?;
    let entries = app.entries.list_for_date(user.id, date)?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    writeln!(out, "Entries for {date} ({})", entries.len())?;
    for entry in &entries {
        write_entry(out, entry)?;
    }
    Ok(())
}

fn add(
    app: &App,
    out: &mut impl Write,
    user: &SessionUser,
    kind: &str,
    title: &str,
    description: Option<&str>,
    date: Option<&str>,
) -> Result<()> {
    let entry = NewEntry {
        user_id: user.id,
        kind: validation::kind(kind)?,
        title: validation::title(title)?,
        description: validation::description(description),
        date: day_or_today(date)?,
    };

    let id = app.entries.add(&entry)?;
    info!(entry_id = id, "entry added");
    writeln!(out, "Entry added successfully (#{id})")?;
    Ok(())
}

fn show(app: &App, out: &mut impl Write, user: &SessionUser, id: i64) -> Result<()> {
    match owned_entry(app, user, id)? {
        Some(entry) => {
            writeln!(out, "Date: {}", entry.date)?;
            write_entry(out, &entry)?;
        }
        None => writeln!(out, "Entry #{id} not found")?,
    }
    Ok(())
}

/// Optional replacements for an entry's editable fields.
struct EntryChanges<'a> {
    kind: Option<&'a str>,
    title: Option<&'a str>,
    description: Option<&'a str>,
    date: Option<&'a str>,
}

fn edit(
    app: &App,
    out: &mut impl Write,
    user: &SessionUser,
    id: i64,
    changes: EntryChanges<'_>,
) -> Result<()> {
    let Some(mut entry) = owned_entry(app, user, id)? else {
        writeln!(out, "Entry #{id} not found")?;
        return Ok(());
    };

    if let Some(kind) = changes.kind {
        entry.kind = validation::kind(kind)?;
    }
    if let Some(title) = changes.title {
        entry.title = validation::title(title)?;
    }
    if let Some(description) = changes.description {
        entry.description = validation::description(Some(description));
    }
    if let Some(date) = changes.date {
        entry.date = validation::date(date)?;
    }

    if app.entries.update(&entry)? {
        writeln!(out, "Entry updated successfully")?;
    } else {
        writeln!(out, "Failed to update entry")?;
    }
    Ok(())
}

fn delete(app: &App, out: &mut impl Write, user: &SessionUser, id: i64) -> Result<()> {
    if owned_entry(app, user, id)?.is_none() {
        writeln!(out, "Entry #{id} not found")?;
        return Ok(());
    }

    if app.entries.delete(id)? > 0 {
        writeln!(out, "Entry #{id} deleted")?;
    } else {
        writeln!(out, "Entry #{id} not found")?;
    }
    Ok(())
}

fn calendar(app: &App, out: &mut impl Write, user: &SessionUser, month: Option<&str>) -> Result<()> {
    let (first, last) = match month {
        Some(raw) => validation::month(raw)?,
        None => {
            let today = helpers::today();
            validation::month(&format!("{:04}-{:02}", today.year(), today.month()))?
        }
    };

    let days = app.entries.dates_with_entries(user.id, first, last)?;
    writeln!(
        out,
        "Calendar for {} ({} days with entries)",
        first.format("%Y-%m"),
        days.len()
    )?;
    for (day, count) in days {
        let noun = if count == 1 { "entry" } else { "entries" };
        writeln!(out, "  {day}  {count} {noun}")?;
    }
    Ok(())
}

fn write_entry(out: &mut impl Write, entry: &Entry) -> std::io::Result<()> {
    writeln!(
        out,
        "  [#{}] {:<8} {}",
        entry.id,
        entry.kind.as_str().to_uppercase(),
        entry.title
    )?;
    if let Some(description) = &entry.description {
        writeln!(out, "           {description}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
