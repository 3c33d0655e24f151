use axum::{
    routing::{get, put},
    Router,
};

use crate::handlers::users;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(users::me))
        .route("/users/me", put(users::update_me))
        .route("/users/:id", get(users::get_user))
}
