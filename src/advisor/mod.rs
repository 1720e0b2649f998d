//! Outfit advisor: critiques an outfit with a chat-completion model.

pub mod apparel;
mod dto;
mod error;
mod extract;
pub mod handlers;
mod normalize;
mod parse;
mod prompt;
pub mod provider;
mod repo;
mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::advisor_routes()
}
