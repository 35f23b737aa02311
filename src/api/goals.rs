use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, patch},
    Router,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::api::{today, AppState};
use crate::auth::{session_auth_middleware, AuthUser};
use crate::error::ApiError;
use crate::models::{GoalInput, GoalProgressInput, GoalQuery, GoalResponse};

pub fn goals_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_goals).post(create_goal))
        .route("/:goal_id", get(get_goal).put(update_goal).delete(delete_goal))
        .route("/:goal_id/progress", patch(update_progress))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            session_auth_middleware,
        ))
}

/// Get all goals for the authenticated user
async fn get_goals(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<GoalQuery>, ApiError>,
) -> Result<Json<Vec<GoalResponse>>, ApiError> {
    Ok(Json(state.goals.list_goals(session.user_id, query, today()).await?))
}

/// Get a specific goal
async fn get_goal(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(goal_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<GoalResponse>, ApiError> {
    let goal = state.goals.get_goal(session.user_id, goal_id).await?;
    Ok(Json(GoalResponse::new(goal, today())))
}

/// Create a new goal
#[tracing::instrument(skip(state, session, input))]
async fn create_goal(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Json(input), _): WithRejection<Json<GoalInput>, ApiError>,
) -> Result<(StatusCode, Json<GoalResponse>), ApiError> {
    let today = today();
    let goal = state.goals.create_goal(session.user_id, input, today).await?;
    Ok((StatusCode::CREATED, Json(GoalResponse::new(goal, today))))
}

/// Update an existing goal
#[tracing::instrument(skip(state, session, input))]
async fn update_goal(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(goal_id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(input), _): WithRejection<Json<GoalInput>, ApiError>,
) -> Result<Json<GoalResponse>, ApiError> {
    let goal = state.goals.update_goal(session.user_id, goal_id, input).await?;
    Ok(Json(GoalResponse::new(goal, today())))
}

/// Set the current value of a goal
#[tracing::instrument(skip(state, session, input))]
async fn update_progress(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(goal_id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(input), _): WithRejection<Json<GoalProgressInput>, ApiError>,
) -> Result<Json<GoalResponse>, ApiError> {
    let goal = state
        .goals
        .update_progress(session.user_id, goal_id, input)
        .await?;
    Ok(Json(GoalResponse::new(goal, today())))
}

/// Delete a goal
#[tracing::instrument(skip(state, session))]
async fn delete_goal(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(goal_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<StatusCode, ApiError> {
    state.goals.delete_goal(session.user_id, goal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
