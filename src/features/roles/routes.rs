use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::features::roles::handlers::role_handler;
use crate::features::roles::services::RoleService;

/// Role administration (administrators only)
pub fn routes(service: Arc<RoleService>) -> Router {
    Router::new()
        .route("/api/admin/roles", get(role_handler::list_roles))
        .route(
            "/api/admin/roles/{id}/permissions",
            patch(role_handler::update_role_permissions),
        )
        .with_state(service)
}
