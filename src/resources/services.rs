//! Resource operations. Each takes the caller's identity explicitly; single
//! resource reads and writes go through the ownership guard, collection
//! queries are scoped to the caller's id.

use tracing::info;
use uuid::Uuid;

use super::{
    dto::{CreateResourceRequest, UpdateResourceRequest},
    model::{
        validate_description, validate_tags, validate_title, KindFields, NewResource, Resource,
        ResourceKind,
    },
    repo::ResourceStore,
};
use crate::{
    auth::{guard, AuthUser},
    error::{AppError, AppResult},
    fields::non_empty,
    pagination::Page,
};

/// Validates the whole request before the store is touched.
pub fn new_resource(owner: &AuthUser, req: CreateResourceRequest) -> AppResult<NewResource> {
    let title = validate_title(&req.title)?;
    let kind = ResourceKind::build(
        &req.kind,
        KindFields {
            url: req.url,
            category: req.category,
            language: req.language,
            code_content: req.code_content,
        },
    )?;
    let description = validate_description(&req.description)?;
    let tags = validate_tags(req.tags)?;
    Ok(NewResource {
        owner_id: owner.user_id,
        title,
        kind,
        description,
        tags,
    })
}

/// Applies the present fields of `req` over `existing` and re-validates the
/// result. Owner, id and creation time are carried over untouched.
pub fn merge_update(existing: &Resource, req: UpdateResourceRequest) -> AppResult<Resource> {
    let title = match non_empty(req.title) {
        Some(t) => validate_title(&t)?,
        None => existing.title.clone(),
    };
    let description = match non_empty(req.description) {
        Some(d) => validate_description(&d)?,
        None => existing.description.clone(),
    };
    let tags = match req.tags {
        Some(t) => validate_tags(t)?,
        None => existing.tags.clone(),
    };

    let kind_name = non_empty(req.kind).unwrap_or_else(|| existing.kind.name().to_string());
    let mut fields = existing.kind.to_fields();
    if let Some(v) = non_empty(req.url) {
        fields.url = Some(v);
    }
    if let Some(v) = non_empty(req.category) {
        fields.category = Some(v);
    }
    if let Some(v) = non_empty(req.language) {
        fields.language = Some(v);
    }
    if let Some(v) = non_empty(req.code_content) {
        fields.code_content = Some(v);
    }
    let kind = ResourceKind::build(&kind_name, fields)?;

    Ok(Resource {
        title,
        kind,
        description,
        tags,
        ..existing.clone()
    })
}

pub async fn create_resource(
    store: &dyn ResourceStore,
    user: &AuthUser,
    req: CreateResourceRequest,
) -> AppResult<Resource> {
    let new = new_resource(user, req)?;
    let created = store.create(new).await?;
    info!(resource_id = %created.id, user_id = %user.user_id, kind = created.kind.name(), "resource created");
    Ok(created)
}

/// Loads a resource and checks the caller owns it.
pub async fn owned_resource(
    store: &dyn ResourceStore,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<Resource> {
    let resource = store.get_by_id(id).await?;
    guard::ensure_owner(user, resource.owner_id)?;
    Ok(resource)
}

pub async fn update_resource(
    store: &dyn ResourceStore,
    user: &AuthUser,
    existing: Resource,
    req: UpdateResourceRequest,
) -> AppResult<Resource> {
    guard::ensure_owner(user, existing.owner_id)?;
    let merged = merge_update(&existing, req)?;
    let updated = store.update(&merged).await?;
    info!(resource_id = %updated.id, user_id = %user.user_id, "resource updated");
    Ok(updated)
}

pub async fn delete_resource(
    store: &dyn ResourceStore,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<()> {
    let resource = owned_resource(store, user, id).await?;
    store.delete(resource.id).await?;
    info!(resource_id = %id, user_id = %user.user_id, "resource deleted");
    Ok(())
}

pub async fn list_resources(
    store: &dyn ResourceStore,
    user: &AuthUser,
    page: Page,
) -> AppResult<(Vec<Resource>, i64)> {
    store.get_by_owner(user.user_id, page).await
}

pub async fn search_resources(
    store: &dyn ResourceStore,
    user: &AuthUser,
    text: Option<String>,
    page: Page,
) -> AppResult<(Vec<Resource>, i64)> {
    let text = non_empty(text)
        .ok_or_else(|| AppError::validation("q query parameter is required"))?;
    store.search(text.trim(), user.user_id, page).await
}

pub async fn resources_by_tags(
    store: &dyn ResourceStore,
    user: &AuthUser,
    tags: &[String],
    page: Page,
) -> AppResult<(Vec<Resource>, i64)> {
    store.get_by_tags(tags, user.user_id, page).await
}
