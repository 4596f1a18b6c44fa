//! Bookly Server
//!
//! A small REST JSON API for a library's books: users register and log in,
//! authenticated users list, add and remove books. Removed books are only
//! marked deleted and purged from storage in batches by a background task.

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
    pub services: Arc<services::Services>,
}
