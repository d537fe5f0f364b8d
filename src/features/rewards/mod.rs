//! Reward tiers and points accrual.
//!
//! Citizens collect points by submitting reports. Whenever a citizen's total
//! reaches a tier's `points_required`, the tier is granted automatically in
//! the same transaction that credited the points (see
//! [`RewardService::award_points_tx`]). Administrators manage the catalog and
//! may grant or revoke tiers by hand.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::RewardService;
