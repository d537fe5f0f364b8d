mod reward_service;

pub use reward_service::RewardService;
