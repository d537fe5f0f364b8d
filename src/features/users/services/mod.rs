mod user_profile_service;
mod user_service;

pub use user_profile_service::UserProfileService;
pub use user_service::UserService;
