mod handler_profile_service;
mod handler_service;

pub use handler_profile_service::HandlerProfileService;
pub use handler_service::HandlerService;
