use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        extractors::AuthUser,
        services,
    },
    error::{AppError, AppResult},
    response::ApiResponse,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, ApiResponse<AuthResponse>)> {
    let Json(req) = payload?;
    let res = services::register(state.users.as_ref(), &state.jwt, req).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(res, "User registered successfully"),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let Json(req) = payload?;
    let res = services::login(state.users.as_ref(), &state.jwt, req).await?;
    Ok(ApiResponse::ok(res, "Login successful"))
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> ApiResponse<()> {
    ApiResponse::message("User logged out successfully")
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<ApiResponse<PublicUser>> {
    let record = match state.users.get_by_id(user.user_id).await {
        Ok(u) => u,
        Err(AppError::NotFound(_)) => {
            return Err(AppError::Unauthenticated("user not found".into()))
        }
        Err(e) => return Err(e),
    };
    Ok(ApiResponse::ok(
        PublicUser::from(record),
        "User retrieved successfully",
    ))
}
