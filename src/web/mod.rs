//! HTTP front end.
//!
//! An axum router over a shared store. Every note route takes a
//! [`auth::CurrentUser`], so anonymous requests are redirected to the login
//! page before any handler code runs.

pub mod auth;
pub mod error;
mod handlers;
pub mod render;
mod trace;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{info, Level};

use crate::error::Result;
use crate::storage::Store;

pub use auth::SessionConfig;
pub use error::WebError;
pub use trace::REQUEST_ID_HEADER;

/// Where successful create/update/delete and login land.
pub const NOTES_URL: &str = "/notes/";

/// Store shared by all requests; each request holds the lock for one operation.
pub type SharedStore = Arc<Mutex<dyn Store>>;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub sessions: SessionConfig,
}

impl AppState {
    pub fn new<S: Store + 'static>(store: S) -> Self {
        let store: SharedStore = Arc::new(Mutex::new(store));
        Self {
            store,
            sessions: SessionConfig::default(),
        }
    }

    pub fn with_sessions(mut self, sessions: SessionConfig) -> Self {
        self.sessions = sessions;
        self
    }
}

/// `302 Found` to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(NOTES_URL, get(handlers::note_list))
        .route("/note/{id}/", get(handlers::note_detail))
        .route(
            "/note-create/",
            get(handlers::note_create_form).post(handlers::note_create),
        )
        .route(
            "/note/{id}/update/",
            get(handlers::note_update_form).post(handlers::note_update),
        )
        .route(
            "/note/{id}/delete/",
            get(handlers::note_delete_confirm).post(handlers::note_delete),
        )
        .route(
            auth::LOGIN_URL,
            get(handlers::login_form).post(handlers::login),
        )
        .route("/accounts/logout/", post(handlers::logout))
        .fallback(handlers::not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::request_span)
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(trace::MakeRequestUuid))
        .with_state(state)
}

/// Serve until `shutdown` is cancelled.
pub async fn serve(state: AppState, addr: SocketAddr, shutdown: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("server stopped");
    Ok(())
}
