use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::auth::{safe_next, CurrentUser, LOGIN_URL};
use super::error::WebError;
use super::render::{self, NoteDetailView, NoteFormView, NoteListView};
use super::{found, AppState, NOTES_URL};
use crate::auth;
use crate::entity::{NoteDraft, NoteId};
use crate::error::NotekeeperError;
use crate::search::TitleFilter;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "search-area")]
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginParams {
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Ids that do not parse are treated like ids that do not exist.
fn parse_id(raw: &str) -> Result<NoteId, WebError> {
    raw.parse::<i64>().map(NoteId).map_err(|_| WebError::NotFound)
}

pub async fn index() -> Response {
    found(NOTES_URL)
}

pub async fn not_found() -> WebError {
    WebError::NotFound
}

pub async fn note_list(
    CurrentUser { user, .. }: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let filter = TitleFilter::from_input(params.search.as_deref());

    let (count, notes) = {
        let store = state.store.lock().await;
        (
            store.count_by_owner(user.id)?,
            store.list_by_owner(user.id, &filter)?,
        )
    };
    debug!(user_id = %user.id, count, shown = notes.len(), "listed notes");

    let view = NoteListView {
        user: user.username,
        count,
        search_input: params.search.unwrap_or_default(),
        notes,
    };
    Ok(render::negotiate(&headers, &view, render::note_list_page))
}

pub async fn note_detail(
    CurrentUser { user, .. }: CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let id = parse_id(&raw_id)?;
    let note = state
        .store
        .lock()
        .await
        .get_by_id(user.id, id)?
        .ok_or(WebError::NotFound)?;

    let view = NoteDetailView {
        user: user.username,
        note,
    };
    Ok(render::negotiate(&headers, &view, render::note_detail_page))
}

fn create_form(draft: NoteDraft) -> NoteFormView {
    NoteFormView {
        heading: "Create note",
        action: "/note-create/".to_string(),
        draft,
        errors: Vec::new(),
    }
}

pub async fn note_create_form(_user: CurrentUser) -> Html<String> {
    Html(render::note_form_page(&create_form(NoteDraft::default())))
}

pub async fn note_create(
    CurrentUser { user, .. }: CurrentUser,
    State(state): State<AppState>,
    Form(draft): Form<NoteDraft>,
) -> Result<Response, WebError> {
    let errors = draft.errors();
    if !errors.is_empty() {
        debug!(user_id = %user.id, errors = errors.len(), "rejected note form");
        let view = create_form(draft).with_errors(errors);
        return Ok(render::note_form_response(StatusCode::BAD_REQUEST, &view));
    }

    let note = state.store.lock().await.create(user.id, &draft)?;
    info!(user_id = %user.id, note_id = %note.id, "note created");
    Ok(found(NOTES_URL))
}

fn update_form(id: NoteId, draft: NoteDraft) -> NoteFormView {
    NoteFormView {
        heading: "Edit note",
        action: format!("/note/{id}/update/"),
        draft,
        errors: Vec::new(),
    }
}

pub async fn note_update_form(
    CurrentUser { user, .. }: CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Html<String>, WebError> {
    let id = parse_id(&raw_id)?;
    let note = state
        .store
        .lock()
        .await
        .get_by_id(user.id, id)?
        .ok_or(WebError::NotFound)?;

    let draft = NoteDraft::new(note.title, note.description);
    Ok(Html(render::note_form_page(&update_form(id, draft))))
}

pub async fn note_update(
    CurrentUser { user, .. }: CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Form(draft): Form<NoteDraft>,
) -> Result<Response, WebError> {
    let id = parse_id(&raw_id)?;
    let store = state.store.lock().await;

    // foreign ids 404 before the form is looked at
    if store.get_by_id(user.id, id)?.is_none() {
        warn!(user_id = %user.id, note_id = %id, "update of missing or foreign note");
        return Err(WebError::NotFound);
    }

    let errors = draft.errors();
    if !errors.is_empty() {
        let view = update_form(id, draft).with_errors(errors);
        return Ok(render::note_form_response(StatusCode::BAD_REQUEST, &view));
    }

    match store.update(user.id, id, &draft)? {
        Some(note) => {
            info!(user_id = %user.id, note_id = %note.id, "note updated");
            Ok(found(NOTES_URL))
        }
        None => Err(WebError::NotFound),
    }
}

pub async fn note_delete_confirm(
    CurrentUser { user, .. }: CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Html<String>, WebError> {
    let id = parse_id(&raw_id)?;
    let note = state
        .store
        .lock()
        .await
        .get_by_id(user.id, id)?
        .ok_or(WebError::NotFound)?;
    Ok(Html(render::note_delete_page(&note)))
}

pub async fn note_delete(
    CurrentUser { user, .. }: CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let id = parse_id(&raw_id)?;
    let deleted = state
        .store
        .lock()
        .await
        .delete_by_owner_and_id(user.id, id)?;

    if !deleted {
        warn!(user_id = %user.id, note_id = %id, "delete of missing or foreign note");
        return Err(WebError::NotFound);
    }
    info!(user_id = %user.id, note_id = %id, "note deleted");
    Ok(found(NOTES_URL))
}

pub async fn login_form(Query(params): Query<LoginParams>) -> Html<String> {
    Html(render::login_page(safe_next(params.next.as_deref()), None))
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let next = safe_next(form.next.as_deref()).to_string();
    let store = state.store.lock().await;

    match auth::authenticate(&*store, &form.username, &form.password) {
        Ok(user) => {
            let session = store.create_session(user.id)?;
            info!(user_id = %user.id, "user logged in");
            Ok((
                StatusCode::FOUND,
                [
                    (header::LOCATION, next),
                    (header::SET_COOKIE, state.sessions.cookie(&session.token)),
                ],
            )
                .into_response())
        }
        Err(NotekeeperError::InvalidCredentials) => {
            warn!(username = %form.username, "failed login");
            let page = render::login_page(
                &next,
                Some("Please enter a correct username and password."),
            );
            Ok((StatusCode::UNAUTHORIZED, Html(page)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn logout(
    CurrentUser {
        user,
        session_token,
    }: CurrentUser,
    State(state): State<AppState>,
) -> Result<Response, WebError> {
    state.store.lock().await.delete_session(&session_token)?;
    info!(user_id = %user.id, "user logged out");
    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, LOGIN_URL.to_string()),
            (header::SET_COOKIE, state.sessions.expired_cookie()),
        ],
    )
        .into_response())
}
