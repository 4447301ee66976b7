use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{dto::UpdateUserRequest, services};
use crate::{
    auth::{dto::PublicUser, guard, AuthUser},
    error::AppResult,
    fields::parse_id,
    pagination::{Page, PageQuery},
    response::{ApiResponse, PaginatedResponse},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, _user, query))]
pub async fn list_users(
    State(state): State<AppState>,
    _user: AuthUser,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> AppResult<PaginatedResponse<PublicUser>> {
    let page = Page::from_query(query);
    let (users, total) = state.users.list(page).await?;
    let items = users.into_iter().map(PublicUser::from).collect();
    Ok(PaginatedResponse::new(
        items,
        page,
        total,
        "Users retrieved successfully",
    ))
}

#[instrument(skip(state, _user, path))]
pub async fn get_user(
    State(state): State<AppState>,
    _user: AuthUser,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<ApiResponse<PublicUser>> {
    let Path(id) = path?;
    let id = parse_id(&id)?;
    let record = state.users.get_by_id(id).await?;
    Ok(ApiResponse::ok(
        PublicUser::from(record),
        "User retrieved successfully",
    ))
}

#[instrument(skip(state, user, path, payload), fields(user_id = %user.user_id))]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> AppResult<ApiResponse<PublicUser>> {
    let Path(id) = path?;
    let user_id = guard::ensure_self(&user, &id)?;
    let Json(req) = payload?;
    let updated = services::update_profile(state.users.as_ref(), user_id, req).await?;
    Ok(ApiResponse::ok(
        PublicUser::from(updated),
        "User updated successfully",
    ))
}

#[instrument(skip(state, user, path), fields(user_id = %user.user_id))]
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<ApiResponse<()>> {
    let Path(id) = path?;
    let user_id = guard::ensure_self(&user, &id)?;
    services::delete_account(state.users.as_ref(), user_id).await?;
    Ok(ApiResponse::message("User deleted successfully"))
}
