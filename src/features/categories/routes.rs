use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::categories::handlers::category_handler;
use crate::features::categories::services::CategoryService;

/// Reading the catalog is public; changing it requires ADMIN
pub fn routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route("/api/categories", get(category_handler::list_categories))
        .route("/api/categories/{id}", get(category_handler::get_category))
        .route(
            "/api/admin/categories",
            post(category_handler::create_category),
        )
        .route(
            "/api/admin/categories/{id}",
            put(category_handler::update_category).delete(category_handler::delete_category),
        )
        .with_state(service)
}
