pub(crate) mod dto;
pub mod generator;
pub mod handlers;
mod prompt;
mod repo;
mod repo_types;
mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::tryon_routes()
}
