use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::staff::models::Handler;
use crate::shared::validation::PHONE_REGEX;

const AVATAR_SIZE: u32 = 256;

/// Handler account as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HandlerResponseDto {
    pub id: Uuid,
    pub name: String,
    pub handler_type: String,
    pub resource_availability: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub confirmed: bool,
    pub approved: bool,
    pub avatar_url: String,
    pub image_file: Option<String>,
    pub role_id: Option<Uuid>,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Handler> for HandlerResponseDto {
    fn from(h: Handler) -> Self {
        let avatar_url = h.gravatar(AVATAR_SIZE);
        Self {
            id: h.id,
            name: h.name,
            handler_type: h.handler_type,
            resource_availability: h.resource_availability,
            email: h.email,
            phone_number: h.phone_number,
            confirmed: h.confirmed,
            approved: h.approved,
            avatar_url,
            image_file: h.image_file,
            role_id: h.role_id,
            last_seen: h.last_seen,
            created_at: h.created_at,
        }
    }
}

/// Partial update of a handler's own profile
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateHandlerProfileDto {
    #[validate(
        length(min = 1, max = 255, message = "Name must be between 1 and 255 characters."),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub name: Option<String>,

    #[validate(
        length(min = 1, max = 255, message = "Type must be between 1 and 255 characters."),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub handler_type: Option<String>,

    pub resource_availability: Option<String>,

    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number."))]
    pub phone_number: Option<String>,
}

impl UpdateHandlerProfileDto {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.handler_type.is_none()
            && self.resource_availability.is_none()
            && self.phone_number.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetHandlerApprovalDto {
    pub approved: bool,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListHandlersQuery {
    /// Only handlers still awaiting approval
    #[serde(default)]
    pub pending: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile_update() {
        assert!(UpdateHandlerProfileDto::default().is_empty());
        assert!(UpdateHandlerProfileDto::default().validate().is_ok());
    }

    #[test]
    fn test_profile_update_validation() {
        let dto = UpdateHandlerProfileDto {
            name: Some("  ".to_string()),
            phone_number: Some("abc".to_string()),
            ..Default::default()
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("phone_number"));
        assert!(!dto.is_empty());
    }
}
