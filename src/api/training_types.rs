use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, put},
    Router,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::{session_auth_middleware, AuthUser};
use crate::error::ApiError;
use crate::models::{TrainingType, TrainingTypeInput};

pub fn training_type_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_types).post(create_type))
        .route("/:type_id", put(update_type).delete(delete_type))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            session_auth_middleware,
        ))
}

/// Default types followed by the caller's own
async fn list_types(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> Result<Json<Vec<TrainingType>>, ApiError> {
    Ok(Json(state.training_types.list_types(session.user_id).await?))
}

#[tracing::instrument(skip(state, session, input))]
async fn create_type(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Json(input), _): WithRejection<Json<TrainingTypeInput>, ApiError>,
) -> Result<(StatusCode, Json<TrainingType>), ApiError> {
    let created = state.training_types.create_type(session.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[tracing::instrument(skip(state, session, input))]
async fn update_type(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(type_id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(input), _): WithRejection<Json<TrainingTypeInput>, ApiError>,
) -> Result<Json<TrainingType>, ApiError> {
    Ok(Json(
        state
            .training_types
            .update_type(session.user_id, type_id, input)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session))]
async fn delete_type(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(type_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<StatusCode, ApiError> {
    state.training_types.delete_type(session.user_id, type_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
