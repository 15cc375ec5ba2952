use axum::{
    routing::{get, patch},
    Router,
};

use crate::state::AppState;

pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(handlers::list_tags).post(handlers::create_tag))
        .route(
            "/tags/:id",
            patch(handlers::update_tag).delete(handlers::delete_tag),
        )
}
