use tracing::info;
use uuid::Uuid;

use super::dto::UpdateUserRequest;
use crate::{
    auth::{
        password::hash_password,
        repo::UserStore,
        repo_types::User,
        services::{normalize_email, validate_email, validate_password, validate_username},
    },
    error::AppResult,
    fields::non_empty,
};

/// Merges the present fields into the stored profile, re-validates, persists.
/// The caller has already established that `user_id` is its own id.
pub async fn update_profile(
    users: &dyn UserStore,
    user_id: Uuid,
    req: UpdateUserRequest,
) -> AppResult<User> {
    let mut user = users.get_by_id(user_id).await?;

    if let Some(username) = non_empty(req.username) {
        user.username = username.trim().to_string();
    }
    if let Some(email) = non_empty(req.email) {
        user.email = normalize_email(&email);
    }
    validate_username(&user.username)?;
    validate_email(&user.email)?;

    if let Some(password) = req.password.filter(|p| !p.is_empty()) {
        validate_password(&password)?;
        user.password_hash = hash_password(&password)?;
    }

    let updated = users.update(&user).await?;
    info!(user_id = %updated.id, "user updated");
    Ok(updated)
}

pub async fn delete_account(users: &dyn UserStore, user_id: Uuid) -> AppResult<()> {
    users.delete(user_id).await?;
    info!(user_id = %user_id, "user deleted");
    Ok(())
}
