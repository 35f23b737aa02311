use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use tokio_util::io::ReaderStream;

use crate::api::AppState;
use crate::auth::{session_auth_middleware, AuthUser};
use crate::error::ApiError;

/// `/api/files/{user_id}/{file}`: owner-only download of uploaded media
pub fn file_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/*key", get(serve_file))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            session_auth_middleware,
        ))
}

async fn serve_file(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(key), _): WithRejection<Path<String>, ApiError>,
) -> Result<Response, ApiError> {
    let stored = state.media.open_file(session.user_id, &key).await?;

    let content_type = HeaderValue::from_str(&stored.attachment.mime_type)
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    let body = Body::from_stream(ReaderStream::new(stored.file));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, HeaderValue::from(stored.len)),
            (header::CACHE_CONTROL, HeaderValue::from_static("private, max-age=3600")),
        ],
        body,
    )
        .into_response())
}
