use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::auth::clients::OAuthProvider;
use crate::features::auth::principal::{Principal, PrincipalKind};
use crate::shared::validation::{PHONE_REGEX, USERNAME_REGEX};

/// Request DTO for citizen registration
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterUserDto {
    #[validate(
        email(message = "Invalid email address."),
        length(max = 255, message = "Email must be at most 255 characters.")
    )]
    pub email: String,

    #[validate(
        length(min = 3, max = 255, message = "Username must be between 3 and 255 characters."),
        regex(
            path = *USERNAME_REGEX,
            message = "Usernames must start with a letter or underscore and contain only letters, numbers or underscores."
        )
    )]
    pub username: String,

    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number."))]
    pub phone_number: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords must match."))]
    pub confirm_password: String,
}

/// Request DTO for handler (staff) registration
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterHandlerDto {
    #[validate(
        length(min = 1, max = 255, message = "Name must be between 1 and 255 characters."),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub name: String,

    /// Kind of organisation, e.g. county department or private collector
    #[validate(
        length(min = 1, max = 255, message = "Type must be between 1 and 255 characters."),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub handler_type: String,

    pub resource_availability: Option<String>,

    #[validate(
        email(message = "Invalid email address."),
        length(max = 255, message = "Email must be at most 255 characters.")
    )]
    pub email: String,

    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number."))]
    pub phone_number: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords must match."))]
    pub confirm_password: String,
}

/// Request DTO for logging in either principal kind
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginDto {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,

    /// Keep the session after the browser closes
    #[serde(default)]
    pub remember_me: bool,

    /// Relative path to continue to after logging in
    pub next: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponseDto {
    pub kind: PrincipalKind,
    pub id: Uuid,
    /// Where the client should navigate next
    pub redirect_to: String,
}

/// What a login endpoint expects; returned to anonymous GET requests
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginFormDto {
    pub kind: PrincipalKind,
    pub next: Option<String>,
    pub oauth_providers: Vec<OAuthProvider>,
}

#[derive(Debug, Deserialize)]
pub struct LoginFormQuery {
    pub next: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct PasswordResetRequestDto {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct PasswordResetDto {
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords must match."))]
    pub confirm_password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1, message = "Current password is required."))]
    pub current_password: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub new_password: String,

    #[validate(must_match(other = "new_password", message = "Passwords must match."))]
    pub confirm_password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChangeEmailDto {
    #[validate(
        email(message = "Invalid email address."),
        length(max = 255, message = "Email must be at most 255 characters.")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// Current principal and what it may do
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponseDto {
    pub authenticated: bool,
    pub kind: Option<PrincipalKind>,
    pub id: Option<Uuid>,
    pub email: Option<String>,
    /// Username for citizens, organisation name for handlers
    pub display_name: Option<String>,
    pub confirmed: bool,
    /// Only meaningful for handlers
    pub approved: Option<bool>,
    pub role: Option<String>,
    pub permissions: Vec<String>,
    pub is_administrator: bool,
}

impl From<&Principal> for MeResponseDto {
    fn from(principal: &Principal) -> Self {
        let (display_name, approved) = match principal {
            Principal::User(u) => (Some(u.username.clone()), None),
            Principal::Handler(h) => (Some(h.name.clone()), Some(h.approved)),
            Principal::Anonymous => (None, None),
        };
        let role = principal.role();

        Self {
            authenticated: principal.is_authenticated(),
            kind: principal.kind(),
            id: principal.id(),
            email: principal.email().map(String::from),
            display_name,
            confirmed: principal.is_confirmed(),
            approved,
            role: role.map(|r| r.title.clone()),
            permissions: role
                .map(|r| r.permissions.names().into_iter().map(String::from).collect())
                .unwrap_or_default(),
            is_administrator: principal.is_administrator(),
        }
    }
}
