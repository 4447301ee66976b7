//! Ownership checks. Every single-resource read/update/delete and every
//! profile update/delete goes through here before touching the store.

use uuid::Uuid;

use super::extractors::AuthUser;
use crate::error::{AppError, AppResult};

/// True iff the caller is the recorded owner.
pub fn allow(identity: Option<&AuthUser>, owner_id: Uuid) -> bool {
    identity.is_some_and(|u| u.user_id == owner_id)
}

/// True iff the id named in the route is the caller's own id.
pub fn is_self(identity: Option<&AuthUser>, route_user_id: &str) -> bool {
    match Uuid::parse_str(route_user_id) {
        Ok(id) => allow(identity, id),
        Err(_) => false,
    }
}

pub fn ensure_owner(identity: &AuthUser, owner_id: Uuid) -> AppResult<()> {
    if allow(Some(identity), owner_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub fn ensure_self(identity: &AuthUser, route_user_id: &str) -> AppResult<Uuid> {
    if is_self(Some(identity), route_user_id) {
        Ok(identity.user_id)
    } else {
        Err(AppError::Forbidden)
    }
}
