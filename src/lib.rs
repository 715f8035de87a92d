//! Biblios Library Circulation Server
//!
//! A Rust backend for library lending: borrow/return/extend commands, the
//! loan-status state machine, per-book copy accounting, overdue fines, and
//! transactional book/author/category association maintenance.

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
