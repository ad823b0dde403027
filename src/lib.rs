//! Libris Library Management Server
//!
//! REST JSON API for library owners, admins and readers. The transactional core
//! lives in [`repository`]: inventory copy accounting and the issue request
//! workflow, each operation running in a single Postgres transaction.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
