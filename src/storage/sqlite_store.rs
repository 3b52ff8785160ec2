use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use super::{NoteRepository, UserRepository};
use crate::auth;
use crate::entity::{Note, NoteDraft, NoteId, Session, User, UserId};
use crate::error::{NotekeeperError, Result};
use crate::search::{like_pattern, SearchConfig, TitleFilter};

pub const DATABASE_FILE: &str = "notekeeper.db";

const NOTE_COLUMNS: &str = "id, title, description, owner_id, created_at, updated_at";
const USER_COLUMNS: &str = "id, username, password_hash, created_at";

/// SQLite-backed note and user store
pub struct SqliteStore {
    conn: Connection,
    search: SearchConfig,
}

impl SqliteStore {
    /// Open or create the database at `path`
    pub fn open(path: &Path, search: SearchConfig) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn, search };
        store.init_schema()?;
        Ok(store)
    }

    /// Private database that lives as long as the store; used by tests
    pub fn open_in_memory(search: SearchConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn, search };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notes_owner ON notes(owner_id);

            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
        Ok(Note {
            id: NoteId(row.get(0)?),
            title: row.get(1)?,
            description: row.get(2)?,
            owner: UserId(row.get(3)?),
            created_at: parse_timestamp(row, 4)?,
            updated_at: parse_timestamp(row, 5)?,
        })
    }

    fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: UserId(row.get(0)?),
            username: row.get(1)?,
            password_hash: row.get(2)?,
            created_at: parse_timestamp(row, 3)?,
        })
    }
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl NoteRepository for SqliteStore {
    fn list_by_owner(&self, owner: UserId, filter: &TitleFilter) -> Result<Vec<Note>> {
        let notes = match filter.needle() {
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {NOTE_COLUMNS} FROM notes WHERE owner_id = ?1 ORDER BY id"
                ))?;
                let rows = stmt.query_map(params![owner.0], Self::note_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
            Some(needle) if self.search.case_sensitive => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {NOTE_COLUMNS} FROM notes
                     WHERE owner_id = ?1 AND instr(title, ?2) > 0
                     ORDER BY id"
                ))?;
                let rows = stmt.query_map(params![owner.0, needle], Self::note_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
            Some(needle) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {NOTE_COLUMNS} FROM notes
                     WHERE owner_id = ?1 AND title LIKE ?2 ESCAPE '\\'
                     ORDER BY id"
                ))?;
                let rows =
                    stmt.query_map(params![owner.0, like_pattern(needle)], Self::note_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        Ok(notes)
    }

    fn count_by_owner(&self, owner: UserId) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE owner_id = ?1",
            params![owner.0],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn get_by_id(&self, owner: UserId, id: NoteId) -> Result<Option<Note>> {
        let note = self
            .conn
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1 AND owner_id = ?2"),
                params![id.0, owner.0],
                Self::note_from_row,
            )
            .optional()?;
        Ok(note)
    }

    fn create(&self, owner: UserId, draft: &NoteDraft) -> Result<Note> {
        draft.validate()?;
        let now = Utc::now();

        self.conn.execute(
            "INSERT INTO notes (title, description, owner_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                draft.title,
                draft.description,
                owner.0,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;

        Ok(Note {
            id: NoteId(self.conn.last_insert_rowid()),
            title: draft.title.clone(),
            description: draft.description.clone(),
            owner,
            created_at: now,
            updated_at: now,
        })
    }

    fn update(&self, owner: UserId, id: NoteId, draft: &NoteDraft) -> Result<Option<Note>> {
        draft.validate()?;

        let changed = self.conn.execute(
            "UPDATE notes SET title = ?1, description = ?2, updated_at = ?3
             WHERE id = ?4 AND owner_id = ?5",
            params![
                draft.title,
                draft.description,
                Utc::now().to_rfc3339(),
                id.0,
                owner.0,
            ],
        )?;

        if changed == 0 {
            return Ok(None);
        }
        self.get_by_id(owner, id)
    }

    fn delete_by_owner_and_id(&self, owner: UserId, id: NoteId) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND owner_id = ?2",
            params![id.0, owner.0],
        )?;
        Ok(deleted > 0)
    }
}

impl UserRepository for SqliteStore {
    fn create_user(&self, username: &str, password: &str) -> Result<User> {
        User::validate_username(username)?;
        if password.is_empty() {
            return Err(NotekeeperError::validation("password", "This field is required."));
        }
        if self.find_by_username(username)?.is_some() {
            return Err(NotekeeperError::UserExists(username.to_string()));
        }

        let now = Utc::now();
        let password_hash = auth::hash_password(password)?;
        self.conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, now.to_rfc3339()],
        )?;

        Ok(User {
            id: UserId(self.conn.last_insert_rowid()),
            username: username.to_string(),
            password_hash,
            created_at: now,
        })
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                Self::user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.0],
                Self::user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
        let users = stmt
            .query_map([], Self::user_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn create_session(&self, user_id: UserId) -> Result<Session> {
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id,
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![session.token, user_id.0, session.created_at.to_rfc3339()],
        )?;
        Ok(session)
    }

    fn user_for_session(&self, token: &str, not_before: DateTime<Utc>) -> Result<Option<User>> {
        let cutoff = not_before.to_rfc3339();
        let expired = self
            .conn
            .execute("DELETE FROM sessions WHERE created_at < ?1", params![cutoff])?;
        if expired > 0 {
            debug!(expired, "pruned expired sessions");
        }

        let user = self
            .conn
            .query_row(
                "SELECT u.id, u.username, u.password_hash, u.created_at
                 FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?1 AND s.created_at >= ?2",
                params![token, cutoff],
                Self::user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn delete_session(&self, token: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory(SearchConfig::default()).unwrap()
    }

    fn two_users(store: &SqliteStore) -> (User, User) {
        let u1 = store.create_user("user1", "1X<ISRUkw+tuK").unwrap();
        let u2 = store.create_user("user2", "2HJ1vRV0Z&3iD").unwrap();
        (u1, u2)
    }

    #[test]
    fn test_open_creates_db() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data").join(DATABASE_FILE);
        let _store = SqliteStore::open(&path, SearchConfig::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_reopen_keeps_notes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DATABASE_FILE);

        let owner = {
            let store = SqliteStore::open(&path, SearchConfig::default()).unwrap();
            let user = store.create_user("user1", "pw").unwrap();
            store
                .create(user.id, &NoteDraft::new("kept", "across restarts"))
                .unwrap();
            user.id
        };

        let store = SqliteStore::open(&path, SearchConfig::default()).unwrap();
        let notes = store.list_by_owner(owner, &TitleFilter::none()).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "kept");
    }

    #[test]
    fn test_create_sets_owner() {
        let store = store();
        let (u1, _) = two_users(&store);

        let note = store
            .create(u1.id, &NoteDraft::new("Test Title", "Test Description"))
            .unwrap();
        assert_eq!(note.owner, u1.id);
        assert_eq!(note.absolute_url(), format!("/note/{}/", note.id));

        let fetched = store.get_by_id(u1.id, note.id).unwrap().unwrap();
        assert_eq!(fetched, note);
    }

    #[test]
    fn test_first_note_gets_id_one() {
        let store = store();
        let (u1, _) = two_users(&store);
        let note = store.create(u1.id, &NoteDraft::new("t", "d")).unwrap();
        assert_eq!(note.id, NoteId(1));
        assert_eq!(note.absolute_url(), "/note/1/");
    }

    #[test]
    fn test_create_rejects_invalid_draft() {
        let store = store();
        let (u1, _) = two_users(&store);

        let result = store.create(u1.id, &NoteDraft::new("x".repeat(201), "d"));
        assert!(matches!(result, Err(NotekeeperError::Validation { .. })));
        assert_eq!(store.count_by_owner(u1.id).unwrap(), 0);
    }

    #[test]
    fn test_lists_are_owner_scoped() {
        let store = store();
        let (u1, u2) = two_users(&store);

        for i in 0..5 {
            store
                .create(u1.id, &NoteDraft::new(format!("u1 note {i}"), "d"))
                .unwrap();
            store
                .create(u2.id, &NoteDraft::new(format!("u2 note {i}"), "d"))
                .unwrap();
        }

        assert_eq!(store.count_by_owner(u1.id).unwrap(), 5);
        assert_eq!(store.count_by_owner(u2.id).unwrap(), 5);

        let u1_notes = store.list_by_owner(u1.id, &TitleFilter::none()).unwrap();
        let u2_notes = store.list_by_owner(u2.id, &TitleFilter::none()).unwrap();
        assert!(u1_notes.iter().all(|n| n.owner == u1.id));
        assert!(u2_notes.iter().all(|n| n.owner == u2.id));
        assert!(u1_notes
            .iter()
            .all(|a| u2_notes.iter().all(|b| a.id != b.id)));
    }

    #[test]
    fn test_get_by_id_hides_foreign_notes() {
        let store = store();
        let (u1, u2) = two_users(&store);
        let note = store.create(u1.id, &NoteDraft::new("mine", "d")).unwrap();

        assert!(store.get_by_id(u2.id, note.id).unwrap().is_none());
        assert!(store.get_by_id(u1.id, NoteId(999)).unwrap().is_none());
    }

    #[test]
    fn test_search_substring() {
        let store = store();
        let (u1, u2) = two_users(&store);
        store.create(u1.id, &NoteDraft::new("Buy milk", "d")).unwrap();
        store.create(u1.id, &NoteDraft::new("Call mom", "d")).unwrap();
        store.create(u2.id, &NoteDraft::new("milk for u2", "d")).unwrap();

        let found = store
            .list_by_owner(u1.id, &TitleFilter::from_input(Some("milk")))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Buy milk");

        let found = store
            .list_by_owner(u1.id, &TitleFilter::from_input(Some("nothing here")))
            .unwrap();
        assert!(found.is_empty());

        // count ignores the search filter
        assert_eq!(store.count_by_owner(u1.id).unwrap(), 2);
    }

    #[test]
    fn test_search_case_handling() {
        let insensitive = store();
        let (u1, _) = two_users(&insensitive);
        insensitive
            .create(u1.id, &NoteDraft::new("Buy Milk", "d"))
            .unwrap();
        let found = insensitive
            .list_by_owner(u1.id, &TitleFilter::from_input(Some("milk")))
            .unwrap();
        assert_eq!(found.len(), 1);

        let sensitive = SqliteStore::open_in_memory(SearchConfig {
            case_sensitive: true,
        })
        .unwrap();
        let (u1, _) = two_users(&sensitive);
        sensitive
            .create(u1.id, &NoteDraft::new("Buy Milk", "d"))
            .unwrap();
        let found = sensitive
            .list_by_owner(u1.id, &TitleFilter::from_input(Some("milk")))
            .unwrap();
        assert!(found.is_empty());
        let found = sensitive
            .list_by_owner(u1.id, &TitleFilter::from_input(Some("Milk")))
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_search_wildcards_are_literal() {
        let store = store();
        let (u1, _) = two_users(&store);
        store.create(u1.id, &NoteDraft::new("100% done", "d")).unwrap();
        store.create(u1.id, &NoteDraft::new("1000 done", "d")).unwrap();

        let found = store
            .list_by_owner(u1.id, &TitleFilter::from_input(Some("0%")))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "100% done");

        let found = store
            .list_by_owner(u1.id, &TitleFilter::from_input(Some("_")))
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_update_preserves_id_and_owner() {
        let store = store();
        let (u1, _) = two_users(&store);
        let note = store
            .create(u1.id, &NoteDraft::new("test note", "test note_description"))
            .unwrap();

        let updated = store
            .update(
                u1.id,
                note.id,
                &NoteDraft::new("test note_updated", "test note_description_updated"),
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, note.id);
        assert_eq!(updated.owner, u1.id);
        assert_eq!(updated.title, "test note_updated");
        assert_eq!(updated.description, "test note_description_updated");
        assert_eq!(updated.created_at, note.created_at);
        assert!(updated.updated_at >= note.updated_at);
    }

    #[test]
    fn test_update_by_non_owner_changes_nothing() {
        let store = store();
        let (u1, u2) = two_users(&store);
        let note = store.create(u1.id, &NoteDraft::new("orig", "orig")).unwrap();

        let result = store
            .update(u2.id, note.id, &NoteDraft::new("hijack", "hijack"))
            .unwrap();
        assert!(result.is_none());

        let unchanged = store.get_by_id(u1.id, note.id).unwrap().unwrap();
        assert_eq!(unchanged.title, "orig");
    }

    #[test]
    fn test_delete_is_owner_scoped() {
        let store = store();
        let (u1, u2) = two_users(&store);
        let note = store.create(u1.id, &NoteDraft::new("t", "d")).unwrap();

        assert!(!store.delete_by_owner_and_id(u2.id, note.id).unwrap());
        assert!(store.get_by_id(u1.id, note.id).unwrap().is_some());

        assert!(store.delete_by_owner_and_id(u1.id, note.id).unwrap());
        assert!(store.get_by_id(u1.id, note.id).unwrap().is_none());
        assert!(!store.delete_by_owner_and_id(u1.id, note.id).unwrap());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let store = store();
        store.create_user("user1", "pw").unwrap();
        let result = store.create_user("user1", "other");
        assert!(matches!(result, Err(NotekeeperError::UserExists(name)) if name == "user1"));
    }

    #[test]
    fn test_sessions() {
        let store = store();
        let (u1, _) = two_users(&store);

        let session = store.create_session(u1.id).unwrap();
        let user = store
            .user_for_session(&session.token, session.created_at)
            .unwrap()
            .unwrap();
        assert_eq!(user.id, u1.id);
        assert_eq!(store.get_user(u1.id).unwrap().unwrap().username, "user1");
        assert!(store.get_user(UserId(999)).unwrap().is_none());

        assert!(store.delete_session(&session.token).unwrap());
        assert!(store
            .user_for_session(&session.token, session.created_at)
            .unwrap()
            .is_none());
        assert!(store
            .user_for_session("bogus", session.created_at)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_expired_sessions_are_pruned() {
        let store = store();
        let (u1, _) = two_users(&store);
        let session = store.create_session(u1.id).unwrap();

        let later = session.created_at + chrono::Duration::seconds(1);
        assert!(store.user_for_session(&session.token, later).unwrap().is_none());

        // the row is gone, so an older cutoff no longer finds it either
        assert!(store
            .user_for_session(&session.token, session.created_at)
            .unwrap()
            .is_none());
        assert!(!store.delete_session(&session.token).unwrap());
    }

    #[test]
    fn test_list_users() {
        let store = store();
        two_users(&store);
        let names: Vec<_> = store
            .list_users()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["user1", "user2"]);
    }
}
