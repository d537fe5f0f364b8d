mod oauth_client;

pub use oauth_client::{
    generate_state, validate_callback, OAuthCallbackQuery, OAuthClient, OAuthProvider,
};
