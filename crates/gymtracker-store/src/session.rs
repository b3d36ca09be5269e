//! The locally persisted login session.
//!
//! One implicit session per installation: who is logged in is recorded in a
//! [`PreferenceStore`] namespace under four fixed keys. There is no expiry
//! and no token. The session lasts from [`UserSession::login`] until
//! [`UserSession::logout`], across process restarts.

use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::error::StoreResult;
use crate::prefs::PreferenceStore;
use crate::user_store::User;

/// Default preferences namespace for the session.
pub const DEFAULT_NAMESPACE: &str = "UserSession";

/// Returned by [`UserSession::current_user_id`] when nobody is logged in.
pub const NO_USER: i64 = -1;

const KEY_USER_ID: &str = "user_id";
const KEY_USERNAME: &str = "username";
const KEY_EMAIL: &str = "email";
const KEY_IS_LOGGED_IN: &str = "is_logged_in";

/// Identity of the logged-in user, as recorded in the session.
///
/// Operations that act on behalf of the current user take this as an
/// explicit argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Login session over a preference store.
pub struct UserSession<P> {
    prefs: P,
}

impl<P: PreferenceStore> UserSession<P> {
    pub fn new(prefs: P) -> Self {
        Self { prefs }
    }

    /// Record `user` as logged in.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub fn login(&self, user: &User) -> StoreResult<()> {
        self.prefs.commit(vec![
            (KEY_USER_ID, json!(user.id)),
            (KEY_USERNAME, json!(user.username)),
            (KEY_EMAIL, json!(user.email)),
            (KEY_IS_LOGGED_IN, json!(true)),
        ])?;
        info!(username = %user.username, "session started");
        Ok(())
    }

    /// `false` unless a login has been recorded.
    pub fn is_logged_in(&self) -> StoreResult<bool> {
        self.prefs.get_bool(KEY_IS_LOGGED_IN, false)
    }

    /// Logged-in user id, or [`NO_USER`].
    pub fn current_user_id(&self) -> StoreResult<i64> {
        self.prefs.get_i64(KEY_USER_ID, NO_USER)
    }

    /// Logged-in username, or an empty string.
    pub fn current_username(&self) -> StoreResult<String> {
        self.prefs.get_string(KEY_USERNAME, "")
    }

    /// The full session identity, `None` when logged out.
    pub fn current_user(&self) -> StoreResult<Option<SessionUser>> {
        if !self.is_logged_in()? {
            return Ok(None);
        }
        let id = self.current_user_id()?;
        if id == NO_USER {
            return Ok(None);
        }
        Ok(Some(SessionUser {
            id,
            username: self.current_username()?,
            email: self.prefs.get_string(KEY_EMAIL, "")?,
        }))
    }

    /// Forget the logged-in user.
    #[instrument(skip(self))]
    pub fn logout(&self) -> StoreResult<()> {
        self.prefs.clear()?;
        info!("session cleared");
        Ok(())
    }
}

// ── tests ────────────────────────────────────────────────────────────
