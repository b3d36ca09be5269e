//! Input checks that run before any store call.
//!
//! Each [`ValidationError`] displays as the message shown to the user.
//! Inputs are trimmed before they are checked.

use chrono::NaiveDate;
use gymtracker_store::EntryKind;
use gymtracker_store::entry_store::DATE_FORMAT;
use thiserror::Error;

/// A rejected form input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill all fields")]
    MissingField,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("Please enter a title")]
    MissingTitle,

    #[error("Unknown entry type {0:?} (expected goal, activity or diary)")]
    UnknownKind(String),

    #[error("Invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid month {0:?} (expected YYYY-MM)")]
    InvalidMonth(String),
}

/// Trimmed sign-up fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Check sign-up input: all fields present, confirmation matches, password
/// long enough.
pub fn signup(
    username: &str,
    email: &str,
    password: &str,
    confirm: &str,
    min_password_length: usize,
) -> Result<SignupForm, ValidationError> {
    let (username, email, password, confirm) =
        (username.trim(), email.trim(), password.trim(), confirm.trim());

    if username.is_empty() || email.is_empty() || password.is_empty() || confirm.is_empty() {
        return Err(ValidationError::MissingField);
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < min_password_length {
        return Err(ValidationError::PasswordTooShort(min_password_length));
    }

    Ok(SignupForm {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    })
}

/// Check login input, returning the trimmed `(username, password)`.
pub fn login<'a>(username: &'a str, password: &'a str) -> Result<(&'a str, &'a str), ValidationError> {
    let (username, password) = (username.trim(), password.trim());
    if username.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingField);
    }
    Ok((username, password))
}

/// Trimmed, non-empty entry title.
pub fn title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    Ok(title.to_string())
}

/// Trimmed description; blank means none.
pub fn description(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn kind(raw: &str) -> Result<EntryKind, ValidationError> {
    EntryKind::parse(raw.trim()).ok_or_else(|| ValidationError::UnknownKind(raw.to_string()))
}

pub fn date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

/// Parse `YYYY-MM` into the first and last day of that month.
pub fn month(raw: &str) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let invalid = || ValidationError::InvalidMonth(raw.to_string());

    let first = NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), DATE_FORMAT)
        .map_err(|_| invalid())?;
    let last = first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(invalid)?;
    Ok((first, last))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_accepts_valid_input() {
        let form = signup(" alice ", "a@x.com", "secret1", "secret1", 6).unwrap();
        assert_eq!(form.username, "alice");
        assert_eq!(form.password, "secret1");
    }

    #[test]
    fn signup_requires_every_field() {
        assert_eq!(
            signup("", "a@x.com", "secret1", "secret1", 6),
            Err(ValidationError::MissingField)
        );
        assert_eq!(
            signup("alice", "   ", "secret1", "secret1", 6),
            Err(ValidationError::MissingField)
        );
        assert_eq!(
            signup("alice", "a@x.com", "secret1", "", 6),
            Err(ValidationError::MissingField)
        );
    }

    #[test]
    fn signup_checks_confirmation_before_length() {
        assert_eq!(
            signup("alice", "a@x.com", "abc", "abd", 6),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn signup_enforces_min_length() {
        let err = signup("alice", "a@x.com", "12345", "12345", 6).unwrap_err();
        assert_eq!(err, ValidationError::PasswordTooShort(6));
        assert_eq!(err.to_string(), "Password must be at least 6 characters");
        assert!(signup("alice", "a@x.com", "123456", "123456", 6).is_ok());
    }

    #[test]
    fn min_length_counts_characters() {
        // Five characters, ten UTF-16 code units.
        assert_eq!(
            signup("alice", "a@x.com", "😀😀😀😀😀", "😀😀😀😀😀", 6),
            Err(ValidationError::PasswordTooShort(6))
        );
        assert!(signup("alice", "a@x.com", "pässwö", "pässwö", 6).is_ok());
    }

    #[test]
    fn login_trims_and_requires_fields() {
        assert_eq!(login(" alice ", "pw"), Ok(("alice", "pw")));
        assert_eq!(login("alice", " "), Err(ValidationError::MissingField));
    }

    #[test]
    fn title_and_description() {
        assert_eq!(title("  Run  "), Ok("Run".to_string()));
        assert_eq!(title("   "), Err(ValidationError::MissingTitle));
        assert_eq!(description(Some("  ")), None);
        assert_eq!(description(Some(" note ")), Some("note".to_string()));
        assert_eq!(description(None), None);
    }

    #[test]
    fn kind_and_date_parsing() {
        assert_eq!(kind("Activity"), Ok(EntryKind::Activity));
        assert!(matches!(kind("workout"), Err(ValidationError::UnknownKind(_))));
        assert_eq!(
            date("2024-03-01"),
            Ok(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert!(matches!(date("01/03/2024"), Err(ValidationError::InvalidDate(_))));
    }

    #[test]
    fn month_bounds() {
        let (first, last) = month("2024-02").unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, dec_last) = month("2023-12").unwrap();
        assert_eq!(dec_last, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());

        assert!(month("2024-13").is_err());
        assert!(month("March").is_err());
    }
}
