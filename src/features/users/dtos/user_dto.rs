use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::users::models::User;
use crate::shared::validation::PHONE_REGEX;

const AVATAR_SIZE: u32 = 256;

/// Citizen account as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub phone_number: Option<String>,
    pub confirmed: bool,
    pub active: bool,
    pub points_acquired: i32,
    /// Gravatar URL derived from the e-mail address
    pub avatar_url: String,
    /// Uploaded profile picture, if any
    pub image_file: Option<String>,
    pub role_id: Option<Uuid>,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponseDto {
    fn from(u: User) -> Self {
        let avatar_url = u.gravatar(AVATAR_SIZE);
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            phone_number: u.phone_number,
            confirmed: u.confirmed,
            active: u.active,
            points_acquired: u.points_acquired,
            avatar_url,
            image_file: u.image_file,
            role_id: u.role_id,
            last_seen: u.last_seen,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePhoneDto {
    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number."))]
    pub phone_number: String,
}

/// Admin request to (de)activate an account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetUserActiveDto {
    pub active: bool,
}

/// Admin request to move an account to another role
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetRoleDto {
    pub role_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::avatar::avatar_hash;
    use chrono::Utc;

    #[test]
    fn test_response_uses_stored_avatar_hash() {
        let email = "wanjiru@example.com".to_string();
        let user = User {
            id: Uuid::new_v4(),
            email: email.clone(),
            username: "wanjiru".to_string(),
            phone_number: None,
            password_hash: Some("hash".to_string()),
            confirmed: true,
            active: true,
            avatar_hash: Some(avatar_hash(&email)),
            image_file: None,
            points_acquired: 15,
            last_seen: Utc::now(),
            role_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let dto = UserResponseDto::from(user);
        assert!(dto.avatar_url.contains(&avatar_hash(&email)));
        assert!(dto.avatar_url.contains("s=256"));
        assert_eq!(dto.points_acquired, 15);
    }

    #[test]
    fn test_update_phone_validation() {
        let ok = UpdatePhoneDto {
            phone_number: "0712345678".to_string(),
        };
        let bad = UpdatePhoneDto {
            phone_number: "call me".to_string(),
        };
        assert!(ok.validate().is_ok());
        assert!(bad.validate().is_err());
    }
}
