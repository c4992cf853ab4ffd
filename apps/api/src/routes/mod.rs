pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::accounts::handlers as accounts;
use crate::matching::handlers as matching;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Matching
        .route(
            "/upload-resume/",
            post(matching::handle_upload_resume).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Accounts
        .route("/register/", post(accounts::handle_register))
        .route("/login/", post(accounts::handle_login))
        .route("/me/", get(accounts::handle_me))
        .route(
            "/request-password-reset/",
            post(accounts::handle_request_password_reset),
        )
        .route("/reset-password/", post(accounts::handle_reset_password))
        .with_state(state)
}
