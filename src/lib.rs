//! Training journal backend: trainings, goals, personal records and media,
//! behind email/password sessions, with PDF reports.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;
pub mod validation;

pub use api::{create_routes, AppState};
pub use error::ApiError;
