//! API routes and handlers

pub mod auth;
pub mod dashboard;
pub mod files;
pub mod goals;
pub mod health;
pub mod media;
pub mod personal_records;
pub mod reports;
pub mod routes;
pub mod state;
pub mod training_types;
pub mod trainings;

use chrono::{NaiveDate, Utc};

pub use routes::create_routes;
pub use state::AppState;

/// Today's date as the server sees it.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
