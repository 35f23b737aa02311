use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar, WithRejection,
};

use crate::api::AppState;
use crate::auth::{
    rate_limit_middleware, session_auth_middleware, AuthError, AuthResponse, AuthUser,
    ChangePasswordRequest, ClientInfo, DeleteAccountRequest, ForgotPasswordRequest,
    MessageResponse, ResetPasswordRequest, SessionResponse, SignInRequest, SignUpRequest,
    SESSION_COOKIE,
};
use crate::error::ApiError;

/// Authentication routes, mounted under `/api/auth`
pub fn auth_routes(state: &AppState) -> Router<AppState> {
    let rate_limited = Router::new()
        .route("/sign-up/email", post(sign_up))
        .route("/sign-in/email", post(sign_in))
        .route("/forget-password", post(forget_password))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));

    let protected = Router::new()
        .route("/sign-out", post(sign_out))
        .route("/get-session", get(get_session))
        .route("/change-password", post(change_password))
        .route("/account", delete(delete_account))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            session_auth_middleware,
        ));

    Router::new()
        .route("/reset-password", post(reset_password))
        .merge(rate_limited)
        .merge(protected)
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Register a new user
#[tracing::instrument(skip(state, jar, request))]
async fn sign_up(
    State(state): State<AppState>,
    client: ClientInfo,
    jar: CookieJar,
    WithRejection(Json(request), _): WithRejection<Json<SignUpRequest>, ApiError>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let response = state.auth_service.sign_up(request, client).await?;
    let jar = jar.add(session_cookie(response.token.clone(), state.config.secure_cookies()));
    Ok((jar, Json(response)))
}

/// Sign in with email and password
#[tracing::instrument(skip(state, jar, request))]
async fn sign_in(
    State(state): State<AppState>,
    client: ClientInfo,
    jar: CookieJar,
    WithRejection(Json(request), _): WithRejection<Json<SignInRequest>, ApiError>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let response = state.auth_service.sign_in(request, client).await?;
    let jar = jar.add(session_cookie(response.token.clone(), state.config.secure_cookies()));
    Ok((jar, Json(response)))
}

#[tracing::instrument(skip(state, jar, session))]
async fn sign_out(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AuthError> {
    let response = state.auth_service.sign_out(&session).await?;
    Ok((jar.remove(removal_cookie()), Json(response)))
}

async fn get_session(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> Result<Json<SessionResponse>, AuthError> {
    Ok(Json(state.auth_service.get_session(&session).await?))
}

#[tracing::instrument(skip(state, session, request))]
async fn change_password(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    WithRejection(Json(request), _): WithRejection<Json<ChangePasswordRequest>, ApiError>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(state.auth_service.change_password(&session, request).await?))
}

/// Always answers the same way, whether or not the account exists
#[tracing::instrument(skip(state, request))]
async fn forget_password(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<ForgotPasswordRequest>, ApiError>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(state.auth_service.request_password_reset(request).await?))
}

#[tracing::instrument(skip(state, request))]
async fn reset_password(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<ResetPasswordRequest>, ApiError>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(state.auth_service.reset_password(request).await?))
}

/// Delete the account: uploaded files first, then the user row and everything cascading from it
#[tracing::instrument(skip(state, session, jar, request))]
async fn delete_account(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    jar: CookieJar,
    WithRejection(Json(request), _): WithRejection<Json<DeleteAccountRequest>, ApiError>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    state
        .auth_service
        .verify_user_password(session.user_id, &request.password, "password")
        .await?;

    state.media.delete_files_of_user(session.user_id).await?;
    state.auth_service.delete_user(session.user_id).await?;

    Ok((
        jar.remove(removal_cookie()),
        Json(MessageResponse::new("Account deleted")),
    ))
}
