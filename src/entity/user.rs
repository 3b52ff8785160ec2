use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;
use crate::error::{NotekeeperError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub const USERNAME_MAX_LENGTH: usize = 150;

    /// Usernames are 1..=150 characters with no whitespace.
    pub fn validate_username(username: &str) -> Result<()> {
        if username.is_empty() {
            return Err(NotekeeperError::validation("username", "This field is required."));
        }
        if username.chars().count() > Self::USERNAME_MAX_LENGTH {
            return Err(NotekeeperError::validation(
                "username",
                format!("at most {} characters", Self::USERNAME_MAX_LENGTH),
            ));
        }
        if username.chars().any(char::is_whitespace) {
            return Err(NotekeeperError::validation(
                "username",
                "whitespace is not allowed",
            ));
        }
        Ok(())
    }
}

/// A logged-in browser session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}
