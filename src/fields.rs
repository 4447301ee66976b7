use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Treats a blank string the same as an absent one.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses an id taken from the URL path.
pub fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation(format!("invalid id: {raw}")))
}
