use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::auth::password::Credentials;
use crate::shared::avatar::{avatar_hash, gravatar_url};

/// Database model for a municipal staff account
#[derive(Debug, Clone, FromRow)]
pub struct Handler {
    pub id: Uuid,
    pub name: String,
    pub handler_type: String,
    pub resource_availability: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: Option<String>,
    pub confirmed: bool,
    pub approved: bool,
    pub avatar_hash: Option<String>,
    pub image_file: Option<String>,
    pub last_seen: DateTime<Utc>,
    pub role_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const HANDLER_COLUMNS: &str = "id, name, handler_type, resource_availability, email, phone_number, \
     password_hash, confirmed, approved, avatar_hash, image_file, last_seen, role_id, created_at, updated_at";

impl Handler {
    pub fn gravatar(&self, size: u32) -> String {
        let hash = self
            .avatar_hash
            .clone()
            .unwrap_or_else(|| avatar_hash(&self.email));
        gravatar_url(&hash, size, "identicon", "g")
    }
}

impl Credentials for Handler {
    fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }
}

/// Data for inserting a new handler
#[derive(Debug)]
pub struct NewHandler {
    pub name: String,
    pub handler_type: String,
    pub resource_availability: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub role_id: Uuid,
}
