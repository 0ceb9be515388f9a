pub mod email;
pub mod form;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let public = ServeDir::new(&state.public_dir);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/test-form", get(form::test_form_handler))
        // Typed endpoints
        .route(
            "/api/send-doctor-email",
            post(email::handle_send_doctor_email),
        )
        .route(
            "/api/send-pharmacy-verification",
            post(email::handle_send_pharmacy_verification),
        )
        .route(
            "/api/send-forgot-password",
            post(email::handle_send_forgot_password),
        )
        .route(
            "/api/send-prescription",
            post(email::handle_send_prescription),
        )
        .route("/api/send-invoice", post(email::handle_send_invoice))
        .route("/api/send-token", post(email::handle_send_token))
        // Generic dispatch
        .route("/api/send/:template", post(email::handle_send_template))
        .route("/api/templates", get(email::handle_list_templates))
        .route("/api/test-connection", get(email::handle_test_connection))
        .fallback_service(public)
        .with_state(state)
}
