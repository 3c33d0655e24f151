use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::friends;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/friends", get(friends::list_friends))
        .route("/friends/requests", post(friends::send_request))
        .route("/friends/requests", get(friends::list_incoming_requests))
        .route("/friends/requests/:id", put(friends::respond_to_request))
}
