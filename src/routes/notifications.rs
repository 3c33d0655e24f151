use axum::{routing::post, Router};

use crate::handlers::notifications;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/notifications/token",
        post(notifications::register_push_token),
    )
}
