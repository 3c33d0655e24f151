use axum::{routing::post, Router};

use crate::handlers::reports;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/reports", post(reports::create_report))
}
