//! Browser front end
//!
//! Serves the story form, runs a generation when the form is posted, and
//! renders the story and illustration underneath the form.

pub mod handlers;
pub mod page;

use crate::app::App;
use crate::Result;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tracing::info;

pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/", get(handlers::show_form))
        .route("/generate", post(handlers::generate_story))
        .route("/health", get(handlers::health_check))
        .with_state(app)
}

/// Bind `bind_address` and serve until the process is stopped.
pub async fn serve(app: Arc<App>, bind_address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("Story creator listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(app)).await?;
    Ok(())
}
