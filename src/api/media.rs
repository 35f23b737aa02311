use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use axum_extra::extract::{multipart::MultipartError, Multipart, WithRejection};
use bytes::Bytes;
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::{session_auth_middleware, AuthUser};
use crate::error::ApiError;
use crate::models::{sanitize_file_name, MediaAttachment, MediaEntity, MediaQuery, NewMedia};

/// `/api/media` listing and deletion
pub fn media_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_media))
        .route("/:media_id", delete(delete_media))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            session_auth_middleware,
        ))
}

/// `/api/upload`, with a body limit sized for the largest accepted video
pub fn upload_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(upload))
        .layer(DefaultBodyLimit::max(state.storage_config.max_request_bytes()))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            session_auth_middleware,
        ))
}

struct UploadedFile {
    file_name: String,
    mime_type: String,
    data: Bytes,
}

#[tracing::instrument(skip(state, session, multipart))]
async fn upload(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MediaAttachment>), ApiError> {
    let multipart_error = |err: MultipartError| {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::FileTooLarge {
                limit: state.storage_config.max_video_bytes,
            }
        } else {
            ApiError::BadRequest(err.body_text())
        }
    };

    let mut file: Option<UploadedFile> = None;
    let mut entity_type: Option<String> = None;
    let mut entity_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = sanitize_file_name(field.file_name().unwrap_or_default());
                let mime_type = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadedFile {
                    file_name,
                    mime_type,
                    data,
                });
            }
            Some("entity_type") => entity_type = Some(field.text().await.map_err(multipart_error)?),
            Some("entity_id") => entity_id = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;
    let entity = entity_type
        .as_deref()
        .map(str::trim)
        .and_then(MediaEntity::parse)
        .ok_or_else(|| {
            ApiError::BadRequest("'entity_type' must be 'training' or 'personal_record'".to_string())
        })?;
    let entity_id = entity_id
        .as_deref()
        .map(str::trim)
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or_else(|| ApiError::BadRequest("'entity_id' must be a UUID".to_string()))?;

    let attachment = state
        .media
        .upload(
            session.user_id,
            NewMedia {
                entity,
                entity_id,
                file_name: file.file_name,
                mime_type: file.mime_type,
            },
            file.data,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(attachment)))
}

async fn list_media(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<MediaQuery>, ApiError>,
) -> Result<Json<Vec<MediaAttachment>>, ApiError> {
    Ok(Json(state.media.list_media(session.user_id, query).await?))
}

#[tracing::instrument(skip(state, session))]
async fn delete_media(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Path(media_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<StatusCode, ApiError> {
    state.media.delete_media(session.user_id, media_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
