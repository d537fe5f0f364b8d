use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::auth::password::Credentials;
use crate::shared::avatar::{avatar_hash, gravatar_url};

/// Database model for a citizen account
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub phone_number: Option<String>,
    pub password_hash: Option<String>,
    pub confirmed: bool,
    pub active: bool,
    pub avatar_hash: Option<String>,
    pub image_file: Option<String>,
    pub points_acquired: i32,
    pub last_seen: DateTime<Utc>,
    pub role_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const USER_COLUMNS: &str = "id, email, username, phone_number, password_hash, confirmed, active, \
     avatar_hash, image_file, points_acquired, last_seen, role_id, created_at, updated_at";

impl User {
    pub fn gravatar(&self, size: u32) -> String {
        let hash = self
            .avatar_hash
            .clone()
            .unwrap_or_else(|| avatar_hash(&self.email));
        gravatar_url(&hash, size, "identicon", "g")
    }
}

impl Credentials for User {
    fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }
}

/// Data for inserting a new user
#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub phone_number: Option<String>,
    pub password_hash: Option<String>,
    pub confirmed: bool,
    pub role_id: Uuid,
}
