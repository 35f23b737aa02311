use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{today, AppState};
use crate::auth::{session_auth_middleware, AuthUser};
use crate::error::ApiError;
use crate::reports::ReportFile;

#[derive(Debug, Deserialize)]
pub struct WeeklyReportQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyReportQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub fn report_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/training/:training_id", get(training_report))
        .route("/weekly", get(weekly_report))
        .route("/monthly", get(monthly_report))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            session_auth_middleware,
        ))
}

fn pdf_response(report: ReportFile) -> Response {
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        report.file_name
    ))
    .unwrap_or(HeaderValue::from_static("attachment"));

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.bytes,
    )
        .into_response()
}

#[tracing::instrument(skip(state, session))]
async fn training_report(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(training_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Response, ApiError> {
    let report = state
        .reports
        .training_report(session.user_id, training_id, today())
        .await?;
    Ok(pdf_response(report))
}

#[tracing::instrument(skip(state, session))]
async fn weekly_report(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<WeeklyReportQuery>, ApiError>,
) -> Result<Response, ApiError> {
    let date = query.date.unwrap_or_else(today);
    let report = state.reports.weekly_report(session.user_id, date).await?;
    Ok(pdf_response(report))
}

#[tracing::instrument(skip(state, session))]
async fn monthly_report(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<MonthlyReportQuery>, ApiError>,
) -> Result<Response, ApiError> {
    let today = today();
    let year = query.year.unwrap_or(today.year());
    let month = query.month.unwrap_or(today.month());
    let report = state
        .reports
        .monthly_report(session.user_id, year, month)
        .await?;
    Ok(pdf_response(report))
}
