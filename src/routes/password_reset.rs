use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::password_reset;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Request a reset code (email) or provider OTP (phone)
        .route(
            "/auth/forgot-password",
            post(password_reset::forgot_password),
        )
        // Verify a code without committing a password yet
        .route(
            "/auth/verify-reset-code",
            post(password_reset::verify_reset_code),
        )
        // Re-verify and commit the new password
        .route("/auth/reset-password", post(password_reset::reset_password))
        // Legacy email-link token check
        .route(
            "/auth/verify-reset-token/:token",
            get(password_reset::verify_reset_token),
        )
}
