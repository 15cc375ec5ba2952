use axum::{
    routing::{get, patch},
    Router,
};

use crate::state::AppState;

pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/ingredients",
            get(handlers::list_ingredients).post(handlers::create_ingredient),
        )
        .route(
            "/ingredients/:id",
            patch(handlers::update_ingredient).delete(handlers::delete_ingredient),
        )
}
