use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload. Field names are part of the wire contract with existing clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    pub exp: usize, // expires at (unix timestamp)
}
