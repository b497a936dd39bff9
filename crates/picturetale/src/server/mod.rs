//! HTTP server for the single-page web UI.
//!
//! One interaction at a time: the server holds a single [`Session`] behind an
//! async mutex, and every stage endpoint locks it for the duration of the
//! model call. `GET /api/session` therefore waits for a running stage to
//! finish and only ever reports settled states, never `requested`.

mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use picturetale_core::{Config, Picturetale, Session};
use tokio::sync::Mutex;

pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    session: Arc<Mutex<Session>>,
}

impl ApiState {
    /// Creates state around a fresh session.
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}

/// Creates the UI and API router.
///
/// `max_body` replaces axum's 2 MB default request body limit.
pub fn create_router(state: ApiState, max_body: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/image", post(handlers::upload_image))
        .route("/api/story", post(handlers::generate_story))
        .route("/api/narration", post(handlers::narrate))
        .route("/api/session", get(handlers::session_snapshot))
        .route("/api/audio", get(handlers::download_audio))
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}

/// Build the pipeline and serve until the process is stopped.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    // Slightly above the image limit: oversize uploads are rejected by the validator.
    let max_body = config.limits.max_upload_bytes().saturating_add(1024 * 1024);

    let app = Picturetale::new(config)?;
    let [caption, story, narration] = app.pipeline().provider_names();
    tracing::info!("Providers: caption={caption}, story={story}, narration={narration}");

    let router = create_router(ApiState::new(app.session()), max_body);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
