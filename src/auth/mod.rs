use crate::state::AppState;
use axum::Router;

pub mod code;
pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod services;
pub mod store;

pub fn router() -> Router<AppState> {
    handlers::router()
}
