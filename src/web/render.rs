//! HTML rendering and JSON negotiation.
//!
//! Pages are plain server-rendered HTML. List and detail views also render
//! as JSON when the client asks for `application/json`.

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use serde::Serialize;

use super::auth::LOGIN_URL;
use super::NOTES_URL;
use crate::entity::{Note, NoteDraft};
use crate::error::NotekeeperError;

/// Context of the note list page.
#[derive(Debug, Clone, Serialize)]
pub struct NoteListView {
    pub user: String,
    /// Number of notes the user owns, before search filtering.
    pub count: usize,
    pub search_input: String,
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteDetailView {
    pub user: String,
    pub note: Note,
}

/// A create or update form, possibly with errors from a failed submit.
#[derive(Debug, Clone, Default)]
pub struct NoteFormView {
    pub heading: &'static str,
    pub action: String,
    pub draft: NoteDraft,
    pub errors: Vec<(String, String)>,
}

impl NoteFormView {
    pub fn with_errors(mut self, errors: Vec<NotekeeperError>) -> Self {
        self.errors = errors
            .into_iter()
            .map(|err| match err {
                NotekeeperError::Validation { field, message } => (field, message),
                other => ("__all__".to_string(), other.to_string()),
            })
            .collect();
        self
    }
}

/// True when the `Accept` header prefers JSON.
pub fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false)
}

/// Render `view` as JSON or through `html`, depending on `Accept`.
pub fn negotiate<T, F>(headers: &HeaderMap, view: &T, html: F) -> Response
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    if wants_json(headers) {
        Json(view).into_response()
    } else {
        Html(html(view)).into_response()
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\">\
         <title>{}</title></head>\n<body>\n{}\n</body>\n</html>\n",
        text(title),
        body
    )
}

fn logout_form(user: &str) -> String {
    format!(
        "<header><span class=\"user\">{}</span>\
         <form method=\"post\" action=\"/accounts/logout/\"><button>Log out</button></form></header>",
        text(user)
    )
}

pub fn note_list_page(view: &NoteListView) -> String {
    let mut body = logout_form(&view.user);
    body.push_str(&format!(
        "\n<h1>My notes</h1>\n<p class=\"count\" data-count=\"{}\">You have {} note{}</p>\n\
         <form method=\"get\" action=\"{NOTES_URL}\">\
         <input type=\"text\" name=\"search-area\" value=\"{}\"><button>Search</button></form>\n\
         <a href=\"/note-create/\">Add note</a>\n<ul class=\"notes\">\n",
        view.count,
        view.count,
        if view.count == 1 { "" } else { "s" },
        attr(&view.search_input)
    ));
    if view.notes.is_empty() {
        body.push_str("<li class=\"empty\">No notes found.</li>\n");
    }
    for note in &view.notes {
        body.push_str(&format!(
            "<li data-id=\"{}\"><a href=\"{}\">{}</a> \
             <a href=\"{}\">Edit</a> <a href=\"{}\">Delete</a></li>\n",
            note.id,
            note.absolute_url(),
            text(&note.title),
            note.update_url(),
            note.delete_url()
        ));
    }
    body.push_str("</ul>");
    page("My notes", &body)
}

pub fn note_detail_page(view: &NoteDetailView) -> String {
    let note = &view.note;
    let body = format!(
        "{}\n<h1>{}</h1>\n<div class=\"description\">{}</div>\n\
         <p class=\"meta\">Created {}</p>\n\
         <a href=\"{}\">Edit</a> <a href=\"{}\">Delete</a> <a href=\"{NOTES_URL}\">Back</a>",
        logout_form(&view.user),
        text(&note.title),
        text(&note.description),
        note.created_at.format("%Y-%m-%d %H:%M UTC"),
        note.update_url(),
        note.delete_url()
    );
    page(&note.title, &body)
}

pub fn note_form_page(view: &NoteFormView) -> String {
    let mut body = format!("<h1>{}</h1>\n", text(view.heading));
    if !view.errors.is_empty() {
        body.push_str("<ul class=\"errors\">\n");
        for (field, message) in &view.errors {
            body.push_str(&format!(
                "<li data-field=\"{}\">{}: {}</li>\n",
                attr(field),
                text(field),
                text(message)
            ));
        }
        body.push_str("</ul>\n");
    }
    body.push_str(&format!(
        "<form method=\"post\" action=\"{}\">\n\
         <label>Title <input type=\"text\" name=\"title\" maxlength=\"{}\" value=\"{}\"></label>\n\
         <label>Description <textarea name=\"description\">{}</textarea></label>\n\
         <button>Submit</button>\n</form>\n<a href=\"{NOTES_URL}\">Cancel</a>",
        attr(&view.action),
        Note::TITLE_MAX_LENGTH,
        attr(&view.draft.title),
        text(&view.draft.description)
    ));
    page(view.heading, &body)
}

pub fn note_form_response(status: StatusCode, view: &NoteFormView) -> Response {
    (status, Html(note_form_page(view))).into_response()
}

pub fn note_delete_page(note: &Note) -> String {
    let body = format!(
        "<h1>Delete note</h1>\n<p>Are you sure you want to delete \"{}\"?</p>\n\
         <form method=\"post\" action=\"{}\"><button>Delete</button></form>\n\
         <a href=\"{NOTES_URL}\">Cancel</a>",
        text(&note.title),
        note.delete_url()
    );
    page("Delete note", &body)
}

pub fn login_page(next: &str, error: Option<&str>) -> String {
    let error = error
        .map(|message| format!("<p class=\"error\">{}</p>\n", text(message)))
        .unwrap_or_default();
    let body = format!(
        "<h1>Log in</h1>\n{error}<form method=\"post\" action=\"{LOGIN_URL}\">\n\
         <label>Username <input type=\"text\" name=\"username\"></label>\n\
         <label>Password <input type=\"password\" name=\"password\"></label>\n\
         <input type=\"hidden\" name=\"next\" value=\"{}\">\n\
         <button>Log in</button>\n</form>",
        attr(next)
    );
    page("Log in", &body)
}

pub fn not_found_page() -> String {
    page("Not found", "<h1>Not found</h1>")
}

pub fn bad_request_page(message: &str) -> String {
    page(
        "Bad request",
        &format!("<h1>Bad request</h1>\n<p>{}</p>", text(message)),
    )
}

pub fn server_error_page() -> String {
    page("Server error", "<h1>Server error</h1>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{NoteId, UserId};
    use axum::http::HeaderValue;
    use chrono::Utc;

    fn note(title: &str) -> Note {
        let now = Utc::now();
        Note {
            id: NoteId(7),
            title: title.to_string(),
            description: "body".to_string(),
            owner: UserId(1),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let view = NoteFormView {
            heading: "Edit note",
            action: "/note/7/update/".to_string(),
            draft: NoteDraft::new("say \"hi\" & <bye>", "a < b"),
            errors: Vec::new(),
        };
        let html = note_form_page(&view);
        assert!(html.contains("value=\"say &quot;hi&quot; &amp; &lt;bye&gt;\""));
        assert!(html.contains("<textarea name=\"description\">a &lt; b</textarea>"));
    }

    #[test]
    fn test_list_page_escapes_titles() {
        let view = NoteListView {
            user: "user1".to_string(),
            count: 1,
            search_input: String::new(),
            notes: vec![note("<b>bold</b>")],
        };
        let html = note_list_page(&view);
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(!html.contains("<b>bold</b>"));
        assert!(html.contains("data-count=\"1\""));
        assert!(html.contains("href=\"/note/7/\""));
    }

    #[test]
    fn test_form_page_shows_errors() {
        let view = NoteFormView {
            heading: "Create note",
            action: "/note-create/".to_string(),
            draft: NoteDraft::new("", "d"),
            errors: Vec::new(),
        }
        .with_errors(NoteDraft::new("", "d").errors());
        let html = note_form_page(&view);
        assert!(html.contains("data-field=\"title\""));
        assert!(html.contains("maxlength=\"200\""));
    }

    #[test]
    fn test_wants_json() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(wants_json(&headers));
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        assert!(!wants_json(&headers));
    }

    #[test]
    fn test_login_page_keeps_next() {
        let html = login_page("/note-create/", Some("bad password"));
        assert!(html.contains("name=\"next\" value=\"/note-create/\""));
        assert!(html.contains("bad password"));
    }
}
