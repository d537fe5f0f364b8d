use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::Result;
use crate::features::users::dtos::{UpdatePhoneDto, UserResponseDto};
use crate::features::users::services::UserService;
use crate::modules::storage::{LocalStorage, UploadedImage};

/// Self-service profile operations for citizens
pub struct UserProfileService {
    users: Arc<UserService>,
    storage: Arc<LocalStorage>,
    images_dir: PathBuf,
}

impl UserProfileService {
    pub fn new(users: Arc<UserService>, storage: Arc<LocalStorage>, images_dir: PathBuf) -> Self {
        Self {
            users,
            storage,
            images_dir,
        }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserResponseDto> {
        Ok(self.users.get_by_id(user_id).await?.into())
    }

    pub async fn update_phone(&self, user_id: Uuid, dto: UpdatePhoneDto) -> Result<UserResponseDto> {
        let user = self
            .users
            .update_phone(user_id, dto.phone_number.trim())
            .await?;
        Ok(user.into())
    }

    /// Store a new profile picture and drop the previous one
    pub async fn upload_image(
        &self,
        user_id: Uuid,
        image: UploadedImage,
    ) -> Result<UserResponseDto> {
        let previous = self.users.get_by_id(user_id).await?.image_file;

        let stored = self.storage.save_image(&image, &self.images_dir).await?;
        let user = match self.users.set_image(user_id, Some(&stored)).await {
            Ok(user) => user,
            Err(e) => {
                // Do not leave an orphan behind when the row update fails
                self.discard(&stored).await;
                return Err(e);
            }
        };

        if let Some(old) = previous {
            self.discard(&old).await;
        }

        tracing::info!("User {} updated profile picture", user_id);
        Ok(user.into())
    }

    pub async fn remove_image(&self, user_id: Uuid) -> Result<UserResponseDto> {
        let previous = self.users.get_by_id(user_id).await?.image_file;
        let user = self.users.set_image(user_id, None).await?;

        if let Some(old) = previous {
            self.discard(&old).await;
        }
        Ok(user.into())
    }

    async fn discard(&self, file_name: &str) {
        if let Err(e) = self.storage.delete_image(&self.images_dir, file_name).await {
            tracing::warn!("Failed to remove profile image '{}': {}", file_name, e);
        }
    }
}
