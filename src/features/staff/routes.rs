use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::staff::handlers::{admin_handler, profile_handler};
use crate::features::staff::services::{HandlerProfileService, HandlerService};

pub fn routes(profiles: Arc<HandlerProfileService>, handlers: Arc<HandlerService>) -> Router {
    let profile = Router::new()
        .route(
            "/api/staff/me",
            get(profile_handler::get_profile).patch(profile_handler::update_profile),
        )
        .route(
            "/api/staff/me/image",
            post(profile_handler::upload_image).delete(profile_handler::remove_image),
        )
        .with_state(profiles);

    let admin = Router::new()
        .route("/api/admin/handlers", get(admin_handler::list_handlers))
        .route("/api/admin/handlers/{id}", get(admin_handler::get_handler))
        .route(
            "/api/admin/handlers/{id}/approval",
            patch(admin_handler::set_approval),
        )
        .route(
            "/api/admin/handlers/{id}/role",
            patch(admin_handler::set_role),
        )
        .with_state(handlers);

    profile.merge(admin)
}
