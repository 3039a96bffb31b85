//! API routes and handlers

use axum::{routing::get, Router};

use crate::AppState;

mod access_logs;
mod health;

pub use health::{health_check, root};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(access_logs::routes())
}
