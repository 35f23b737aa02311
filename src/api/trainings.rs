use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::api::{today, AppState};
use crate::auth::{session_auth_middleware, AuthUser};
use crate::error::ApiError;
use crate::models::{Training, TrainingDetail, TrainingInput, TrainingList, TrainingQuery};

pub fn training_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_trainings).post(create_training))
        .route(
            "/:training_id",
            get(get_training).put(update_training).delete(delete_training),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            session_auth_middleware,
        ))
}

/// List the caller's trainings, newest first
async fn list_trainings(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<TrainingQuery>, ApiError>,
) -> Result<Json<TrainingList>, ApiError> {
    Ok(Json(state.trainings.list_trainings(session.user_id, query).await?))
}

async fn get_training(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(training_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<TrainingDetail>, ApiError> {
    Ok(Json(
        state
            .trainings
            .get_training_detail(session.user_id, training_id)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session, input))]
async fn create_training(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Json(input), _): WithRejection<Json<TrainingInput>, ApiError>,
) -> Result<(StatusCode, Json<Training>), ApiError> {
    let training = state
        .trainings
        .create_training(session.user_id, input, today())
        .await?;
    Ok((StatusCode::CREATED, Json(training)))
}

#[tracing::instrument(skip(state, session, input))]
async fn update_training(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(training_id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(input), _): WithRejection<Json<TrainingInput>, ApiError>,
) -> Result<Json<Training>, ApiError> {
    Ok(Json(
        state
            .trainings
            .update_training(session.user_id, training_id, input, today())
            .await?,
    ))
}

#[tracing::instrument(skip(state, session))]
async fn delete_training(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(training_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<StatusCode, ApiError> {
    state
        .trainings
        .delete_training(session.user_id, training_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
