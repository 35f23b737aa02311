use axum::{
    extract::{Query, State},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::{today, AppState};
use crate::auth::{session_auth_middleware, AuthUser};
use crate::error::ApiError;
use crate::models::Dashboard;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// The client's local date; defaults to the server's UTC date.
    pub today: Option<NaiveDate>,
}

pub fn dashboard_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_dashboard))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            session_auth_middleware,
        ))
}

async fn get_dashboard(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<DashboardQuery>, ApiError>,
) -> Result<Json<Dashboard>, ApiError> {
    let today = query.today.unwrap_or_else(today);
    Ok(Json(state.dashboard.dashboard(session.user_id, today).await?))
}
