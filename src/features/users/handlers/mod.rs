pub mod admin_handler;
pub mod profile_handler;
