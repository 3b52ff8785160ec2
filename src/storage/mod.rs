//! Persistence layer.
//!
//! Handlers only talk to the traits below; every note operation takes the
//! requesting owner so a query can never reach another user's rows.

mod sqlite_store;

pub use sqlite_store::{SqliteStore, DATABASE_FILE};

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Note, NoteDraft, NoteId, Session, User, UserId};
use crate::error::Result;
use crate::search::TitleFilter;

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DATABASE_FILE),
        }
    }
}

/// Owner-scoped note persistence.
pub trait NoteRepository {
    /// All notes of `owner` whose title passes `filter`, oldest first.
    fn list_by_owner(&self, owner: UserId, filter: &TitleFilter) -> Result<Vec<Note>>;

    /// Total number of notes owned by `owner`, ignoring any search.
    fn count_by_owner(&self, owner: UserId) -> Result<usize>;

    /// Fetch one note; `None` when it does not exist or belongs to someone else.
    fn get_by_id(&self, owner: UserId, id: NoteId) -> Result<Option<Note>>;

    fn create(&self, owner: UserId, draft: &NoteDraft) -> Result<Note>;

    /// Replace title and description. `None` when no owned note matched.
    fn update(&self, owner: UserId, id: NoteId, draft: &NoteDraft) -> Result<Option<Note>>;

    /// Returns false when no owned note matched.
    fn delete_by_owner_and_id(&self, owner: UserId, id: NoteId) -> Result<bool>;
}

/// User accounts and login sessions.
pub trait UserRepository {
    fn create_user(&self, username: &str, password: &str) -> Result<User>;

    fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    fn get_user(&self, id: UserId) -> Result<Option<User>>;

    fn list_users(&self) -> Result<Vec<User>>;

    fn create_session(&self, user_id: UserId) -> Result<Session>;

    /// The user behind `token`, if the session was created at or after
    /// `not_before`. Sessions older than that are deleted.
    fn user_for_session(&self, token: &str, not_before: DateTime<Utc>) -> Result<Option<User>>;

    fn delete_session(&self, token: &str) -> Result<bool>;
}

/// Everything the web layer needs from a backing store.
pub trait Store: NoteRepository + UserRepository + Send {}

impl<T: NoteRepository + UserRepository + Send> Store for T {}
