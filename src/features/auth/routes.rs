use crate::features::auth::handlers::{auth_handler, oauth_handler};
use crate::features::auth::services::AuthService;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// Auth routes. Endpoints check the session principal themselves, so the
/// whole router sits behind the session layer without a blanket guard.
pub fn routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/auth/register/user", post(auth_handler::register_user))
        .route(
            "/api/auth/register/handler",
            post(auth_handler::register_handler),
        )
        .route(
            "/api/auth/{kind}/login",
            get(auth_handler::login_form).post(auth_handler::login),
        )
        .route("/api/auth/{kind}/logout", post(auth_handler::logout))
        .route(
            "/api/auth/{kind}/confirm/{token}",
            get(auth_handler::confirm),
        )
        .route(
            "/api/auth/{kind}/password-reset-request",
            post(auth_handler::request_password_reset),
        )
        .route(
            "/api/auth/{kind}/password-reset/{token}",
            post(auth_handler::reset_password),
        )
        .route(
            "/api/auth/resend-confirmation",
            post(auth_handler::resend_confirmation),
        )
        .route("/api/auth/reauthenticate", get(auth_handler::reauthenticate))
        .route("/api/auth/me", get(auth_handler::me))
        .route("/api/auth/password", put(auth_handler::change_password))
        .route("/api/auth/email", put(auth_handler::change_email))
        .route(
            "/api/auth/oauth2/{provider}/authorize",
            get(oauth_handler::authorize),
        )
        .route(
            "/api/auth/oauth2/{provider}/callback",
            get(oauth_handler::callback),
        )
        .with_state(service)
}
