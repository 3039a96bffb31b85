//! doorlog library
//!
//! Records physical access-control events (card swipes at doors) and exposes
//! them through a CRUD API, with an append-only plain-text audit trail
//! written on create and delete.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use db::DbPool;
pub use services::AuditTrail;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Database connection pool
    pub db: DbPool,
    /// Audit trail writer (shared, single-writer append)
    pub audit: Arc<AuditTrail>,
}
