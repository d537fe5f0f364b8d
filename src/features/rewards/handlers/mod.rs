pub mod reward_handler;
