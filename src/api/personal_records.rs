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
use crate::models::{
    ActivitySummary, PersonalRecord, PersonalRecordDetail, PersonalRecordInput,
    PersonalRecordQuery,
};

pub fn personal_record_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_records).post(create_record))
        .route("/activities", get(list_activities))
        .route(
            "/:record_id",
            get(get_record).put(update_record).delete(delete_record),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            session_auth_middleware,
        ))
}

async fn list_records(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<PersonalRecordQuery>, ApiError>,
) -> Result<Json<Vec<PersonalRecord>>, ApiError> {
    Ok(Json(
        state
            .personal_records
            .list_records(session.user_id, query)
            .await?,
    ))
}

async fn list_activities(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> Result<Json<Vec<ActivitySummary>>, ApiError> {
    Ok(Json(state.personal_records.list_activities(session.user_id).await?))
}

async fn get_record(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(record_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<PersonalRecordDetail>, ApiError> {
    Ok(Json(
        state
            .personal_records
            .get_record_detail(session.user_id, record_id)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session, input))]
async fn create_record(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Json(input), _): WithRejection<Json<PersonalRecordInput>, ApiError>,
) -> Result<(StatusCode, Json<PersonalRecord>), ApiError> {
    let record = state
        .personal_records
        .create_record(session.user_id, input, today())
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[tracing::instrument(skip(state, session, input))]
async fn update_record(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(record_id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(input), _): WithRejection<Json<PersonalRecordInput>, ApiError>,
) -> Result<Json<PersonalRecord>, ApiError> {
    Ok(Json(
        state
            .personal_records
            .update_record(session.user_id, record_id, input, today())
            .await?,
    ))
}

#[tracing::instrument(skip(state, session))]
async fn delete_record(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(record_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<StatusCode, ApiError> {
    state
        .personal_records
        .delete_record(session.user_id, record_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
