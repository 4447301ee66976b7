pub mod dto;
pub mod handlers;
pub mod model;
pub mod repo;
mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::resource_routes()
}
