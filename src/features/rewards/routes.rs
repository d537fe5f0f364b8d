use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::rewards::handlers::reward_handler;
use crate::features::rewards::services::RewardService;

pub fn routes(service: Arc<RewardService>) -> Router {
    Router::new()
        .route("/api/rewards", get(reward_handler::list_rewards))
        .route("/api/rewards/mine", get(reward_handler::my_rewards))
        .route("/api/admin/rewards", post(reward_handler::create_reward))
        .route(
            "/api/admin/rewards/{id}",
            get(reward_handler::get_reward)
                .put(reward_handler::update_reward)
                .delete(reward_handler::delete_reward),
        )
        .route(
            "/api/admin/rewards/{id}/grant",
            post(reward_handler::grant_reward),
        )
        .route(
            "/api/admin/rewards/{id}/revoke",
            post(reward_handler::revoke_reward),
        )
        .route(
            "/api/admin/users/{id}/rewards",
            get(reward_handler::user_rewards),
        )
        .with_state(service)
}
