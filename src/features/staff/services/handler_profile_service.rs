use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::staff::dtos::{HandlerResponseDto, UpdateHandlerProfileDto};
use crate::features::staff::services::HandlerService;
use crate::modules::storage::{LocalStorage, UploadedImage};

/// Self-service profile operations for handlers
pub struct HandlerProfileService {
    handlers: Arc<HandlerService>,
    storage: Arc<LocalStorage>,
    images_dir: PathBuf,
}

impl HandlerProfileService {
    pub fn new(
        handlers: Arc<HandlerService>,
        storage: Arc<LocalStorage>,
        images_dir: PathBuf,
    ) -> Self {
        Self {
            handlers,
            storage,
            images_dir,
        }
    }

    pub async fn get_profile(&self, handler_id: Uuid) -> Result<HandlerResponseDto> {
        Ok(self.handlers.get_by_id(handler_id).await?.into())
    }

    pub async fn update_profile(
        &self,
        handler_id: Uuid,
        dto: UpdateHandlerProfileDto,
    ) -> Result<HandlerResponseDto> {
        if dto.is_empty() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }

        let handler = self
            .handlers
            .update_profile(
                handler_id,
                dto.name.as_deref().map(str::trim),
                dto.handler_type.as_deref().map(str::trim),
                dto.resource_availability.as_deref(),
                dto.phone_number.as_deref().map(str::trim),
            )
            .await?;

        tracing::info!("Handler {} updated profile", handler_id);
        Ok(handler.into())
    }

    /// Store a new profile picture and drop the previous one
    pub async fn upload_image(
        &self,
        handler_id: Uuid,
        image: UploadedImage,
    ) -> Result<HandlerResponseDto> {
        let previous = self.handlers.get_by_id(handler_id).await?.image_file;

        let stored = self.storage.save_image(&image, &self.images_dir).await?;
        let handler = match self.handlers.set_image(handler_id, Some(&stored)).await {
            Ok(handler) => handler,
            Err(e) => {
                self.discard(&stored).await;
                return Err(e);
            }
        };

        if let Some(old) = previous {
            self.discard(&old).await;
        }
        Ok(handler.into())
    }

    pub async fn remove_image(&self, handler_id: Uuid) -> Result<HandlerResponseDto> {
        let previous = self.handlers.get_by_id(handler_id).await?.image_file;
        let handler = self.handlers.set_image(handler_id, None).await?;

        if let Some(old) = previous {
            self.discard(&old).await;
        }
        Ok(handler.into())
    }

    async fn discard(&self, file_name: &str) {
        if let Err(e) = self.storage.delete_image(&self.images_dir, file_name).await {
            tracing::warn!("Failed to remove handler image '{}': {}", file_name, e);
        }
    }
}
