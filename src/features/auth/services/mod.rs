mod account_notifier;
mod auth_service;
mod principal_loader;

pub use account_notifier::AccountNotifier;
pub use auth_service::{AuthService, ConfirmationOutcome};
pub use principal_loader::PrincipalLoader;
