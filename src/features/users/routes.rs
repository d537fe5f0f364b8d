use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::features::users::handlers::{admin_handler, profile_handler};
use crate::features::users::services::{UserProfileService, UserService};

pub fn routes(profiles: Arc<UserProfileService>, users: Arc<UserService>) -> Router {
    let profile = Router::new()
        .route("/api/users/me", get(profile_handler::get_profile))
        .route("/api/users/me/phone", put(profile_handler::update_phone))
        .route(
            "/api/users/me/image",
            post(profile_handler::upload_image).delete(profile_handler::remove_image),
        )
        .with_state(profiles);

    let admin = Router::new()
        .route("/api/admin/users", get(admin_handler::list_users))
        .route("/api/admin/users/{id}", get(admin_handler::get_user))
        .route(
            "/api/admin/users/{id}/active",
            patch(admin_handler::set_active),
        )
        .route("/api/admin/users/{id}/role", patch(admin_handler::set_role))
        .with_state(users);

    profile.merge(admin)
}
