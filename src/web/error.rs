//! Web-layer errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use super::auth::login_url;
use super::{found, render};
use crate::error::NotekeeperError;

#[derive(Error, Debug)]
pub enum WebError {
    /// No valid session; the client is sent to the login page.
    #[error("Login required for {next}")]
    LoginRequired { next: String },

    /// Missing note, foreign note, or an id that is not a number.
    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebError::LoginRequired { .. } => StatusCode::FOUND,
            WebError::NotFound => StatusCode::NOT_FOUND,
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<NotekeeperError> for WebError {
    fn from(err: NotekeeperError) -> Self {
        match err {
            NotekeeperError::Validation { .. } | NotekeeperError::UserExists(_) => {
                WebError::BadRequest(err.to_string())
            }
            other => WebError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            WebError::LoginRequired { next } => found(&login_url(&next)),
            WebError::NotFound => (status, Html(render::not_found_page())).into_response(),
            WebError::BadRequest(message) => {
                (status, Html(render::bad_request_page(&message))).into_response()
            }
            WebError::Internal(message) => {
                // details stay in the log
                tracing::error!(error = %message, "request failed");
                (status, Html(render::server_error_page())).into_response()
            }
        }
    }
}
