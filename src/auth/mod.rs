use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;

pub use jwt::AuthUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(handlers::create_user))
        .route("/users/token", post(handlers::issue_token))
        .route(
            "/users/me",
            get(handlers::get_me)
                .patch(handlers::update_me)
                .fallback(handlers::method_not_allowed),
        )
}
