use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{parse_tags, CreateResourceRequest, SearchQuery, TagsQuery, UpdateResourceRequest},
    model::Resource,
    services,
};
use crate::{
    auth::AuthUser,
    error::AppResult,
    fields::parse_id,
    pagination::{Page, PageQuery},
    response::{ApiResponse, PaginatedResponse},
    state::AppState,
};

pub fn resource_routes() -> Router<AppState> {
    Router::new()
        .route("/resources", get(list_resources).post(create_resource))
        .route("/resources/search", get(search_resources))
        .route("/resources/tags", get(resources_by_tags))
        .route(
            "/resources/:id",
            get(get_resource).put(update_resource).delete(delete_resource),
        )
}

const LISTED: &str = "Resources retrieved successfully";

#[instrument(skip(state, user, payload), fields(user_id = %user.user_id))]
pub async fn create_resource(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateResourceRequest>, JsonRejection>,
) -> AppResult<(StatusCode, ApiResponse<Resource>)> {
    let Json(req) = payload?;
    let created = services::create_resource(state.resources.as_ref(), &user, req).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(created, "Resource created successfully"),
    ))
}

#[instrument(skip(state, user, query), fields(user_id = %user.user_id))]
pub async fn list_resources(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> AppResult<PaginatedResponse<Resource>> {
    let page = Page::from_query(query);
    let (items, total) = services::list_resources(state.resources.as_ref(), &user, page).await?;
    Ok(PaginatedResponse::new(items, page, total, LISTED))
}

#[instrument(skip(state, user, path), fields(user_id = %user.user_id))]
pub async fn get_resource(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<ApiResponse<Resource>> {
    let Path(id) = path?;
    let id = parse_id(&id)?;
    let resource = services::owned_resource(state.resources.as_ref(), &user, id).await?;
    Ok(ApiResponse::ok(resource, "Resource retrieved successfully"))
}

/// Ownership is checked before the body is looked at, so a stranger gets 403
/// even for a malformed payload.
#[instrument(skip(state, user, path, payload), fields(user_id = %user.user_id))]
pub async fn update_resource(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateResourceRequest>, JsonRejection>,
) -> AppResult<ApiResponse<Resource>> {
    let Path(id) = path?;
    let id = parse_id(&id)?;
    let store = state.resources.as_ref();
    let existing = services::owned_resource(store, &user, id).await?;
    let Json(req) = payload?;
    let updated = services::update_resource(store, &user, existing, req).await?;
    Ok(ApiResponse::ok(updated, "Resource updated successfully"))
}

#[instrument(skip(state, user, path), fields(user_id = %user.user_id))]
pub async fn delete_resource(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<ApiResponse<()>> {
    let Path(id) = path?;
    let id = parse_id(&id)?;
    services::delete_resource(state.resources.as_ref(), &user, id).await?;
    Ok(ApiResponse::message("Resource deleted successfully"))
}

#[instrument(skip(state, user, search, query), fields(user_id = %user.user_id))]
pub async fn search_resources(
    State(state): State<AppState>,
    user: AuthUser,
    search: Result<Query<SearchQuery>, QueryRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> AppResult<PaginatedResponse<Resource>> {
    let Query(search) = search?;
    let page = Page::from_query(query);
    let (items, total) =
        services::search_resources(state.resources.as_ref(), &user, search.q, page).await?;
    Ok(PaginatedResponse::new(items, page, total, LISTED))
}

#[instrument(skip(state, user, filter, query), fields(user_id = %user.user_id))]
pub async fn resources_by_tags(
    State(state): State<AppState>,
    user: AuthUser,
    filter: Result<Query<TagsQuery>, QueryRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> AppResult<PaginatedResponse<Resource>> {
    let Query(filter) = filter?;
    let tags = parse_tags(filter.tags.as_deref())?;
    let page = Page::from_query(query);
    let (items, total) =
        services::resources_by_tags(state.resources.as_ref(), &user, &tags, page).await?;
    Ok(PaginatedResponse::new(items, page, total, LISTED))
}
