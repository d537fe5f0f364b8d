pub mod auth_handler;
pub mod oauth_handler;
