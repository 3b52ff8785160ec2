// src/entity/note.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NoteId, UserId};
use crate::error::{NotekeeperError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub description: String,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Maximum title length, counted in characters.
    pub const TITLE_MAX_LENGTH: usize = 200;

    /// Canonical URL of the note's detail page.
    pub fn absolute_url(&self) -> String {
        format!("/note/{}/", self.id)
    }

    pub fn update_url(&self) -> String {
        format!("/note/{}/update/", self.id)
    }

    pub fn delete_url(&self) -> String {
        format!("/note/{}/delete/", self.id)
    }
}

/// User-editable fields of a note, as submitted by the create and update forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Check every field and collect one error per failing field.
    pub fn errors(&self) -> Vec<NotekeeperError> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(NotekeeperError::validation("title", "This field is required."));
        } else {
            let len = self.title.chars().count();
            if len > Note::TITLE_MAX_LENGTH {
                errors.push(NotekeeperError::validation(
                    "title",
                    format!(
                        "Ensure this value has at most {} characters (it has {}).",
                        Note::TITLE_MAX_LENGTH,
                        len
                    ),
                ));
            }
        }

        if self.description.trim().is_empty() {
            errors.push(NotekeeperError::validation(
                "description",
                "This field is required.",
            ));
        }

        errors
    }

    /// Validate the draft, returning the first failure.
    pub fn validate(&self) -> Result<()> {
        match self.errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
