use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::thoughts;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/thoughts", post(thoughts::send_thought))
        .route("/thoughts", get(thoughts::list_received))
}
