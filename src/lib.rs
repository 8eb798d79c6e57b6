//! Local Library catalog server
//!
//! A REST JSON API over a library catalog: books, authors, genres,
//! languages and the physical copies readers borrow, with the
//! librarian-side loan workflow (checkout, return, renewal).

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
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
