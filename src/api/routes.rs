use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::auth::auth_routes;
use super::dashboard::dashboard_routes;
use super::files::file_routes;
use super::goals::goals_routes;
use super::health::health_check;
use super::media::{media_routes, upload_routes};
use super::personal_records::personal_record_routes;
use super::reports::report_routes;
use super::training_types::training_type_routes;
use super::trainings::training_routes;
use super::AppState;
use crate::auth::{cors_layer, security_headers_layer};

pub fn create_routes(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth_routes(&state))
        .nest("/trainings", training_routes(&state))
        .nest("/training-types", training_type_routes(&state))
        .nest("/goals", goals_routes(&state))
        .nest("/personal-records", personal_record_routes(&state))
        .nest("/dashboard", dashboard_routes(&state))
        .nest("/media", media_routes(&state))
        .nest("/upload", upload_routes(&state))
        .nest("/files", file_routes(&state))
        .nest("/reports", report_routes(&state));

    Router::new()
        .route("/health", get(health_check).with_state(state.db.clone()))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(security_headers_layer())
        .layer(cors_layer(&state.config.public_url))
        .with_state(state)
}
