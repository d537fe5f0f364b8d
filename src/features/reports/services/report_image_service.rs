use std::path::PathBuf;
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{ReportImage, REPORT_IMAGE_COLUMNS};
use crate::modules::storage::{LocalStorage, UploadedImage};
use crate::shared::constants::MAX_REPORT_IMAGES_PER_UPLOAD;

/// Photos attached to reports, stored under `<images_dir>/<report_id>/`
pub struct ReportImageService {
    pool: PgPool,
    storage: Arc<LocalStorage>,
    images_dir: PathBuf,
}

impl ReportImageService {
    pub fn new(pool: PgPool, storage: Arc<LocalStorage>, images_dir: PathBuf) -> Self {
        Self {
            pool,
            storage,
            images_dir,
        }
    }

    pub async fn list(&self, report_id: Uuid) -> Result<Vec<ReportImage>> {
        self.owner_of(report_id).await?;
        self.fetch(report_id).await
    }

    /// Attach photos to a report owned by `user_id`.
    ///
    /// Every file is checked before the first one is written; a failure part
    /// way through removes whatever was already stored.
    pub async fn upload(
        &self,
        user_id: Uuid,
        report_id: Uuid,
        images: Vec<UploadedImage>,
    ) -> Result<Vec<ReportImage>> {
        if images.is_empty() {
            return Err(AppError::BadRequest("File is required".to_string()));
        }
        if images.len() > MAX_REPORT_IMAGES_PER_UPLOAD {
            return Err(AppError::BadRequest(format!(
                "At most {} images can be uploaded at once",
                MAX_REPORT_IMAGES_PER_UPLOAD
            )));
        }

        if self.owner_of(report_id).await? != user_id {
            return Err(AppError::Forbidden(
                "Only the author can add images to this report".to_string(),
            ));
        }

        for image in &images {
            self.storage.validate(image)?;
        }

        let folder = self.folder(report_id);
        let mut stored = Vec::with_capacity(images.len());
        for image in &images {
            match self.storage.save_image(image, &folder).await {
                Ok(name) => stored.push(name),
                Err(e) => {
                    self.discard(report_id, &stored).await;
                    return Err(e);
                }
            }
        }

        if let Err(e) = self.insert_rows(report_id, &stored).await {
            self.discard(report_id, &stored).await;
            return Err(e);
        }

        tracing::info!("Stored {} image(s) for report {}", stored.len(), report_id);
        self.fetch(report_id).await
    }

    async fn insert_rows(&self, report_id: Uuid, names: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin transaction: {:?}", e);
            AppError::Database(e)
        })?;

        for name in names {
            sqlx::query("INSERT INTO report_images (report_id, file_name) VALUES ($1, $2)")
                .bind(report_id)
                .bind(name)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to insert report image: {:?}", e);
                    AppError::Database(e)
                })?;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit report images: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn fetch(&self, report_id: Uuid) -> Result<Vec<ReportImage>> {
        sqlx::query_as::<_, ReportImage>(&format!(
            "SELECT {} FROM report_images WHERE report_id = $1 ORDER BY created_at",
            REPORT_IMAGE_COLUMNS
        ))
        .bind(report_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list report images: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn owner_of(&self, report_id: Uuid) -> Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM reports WHERE id = $1")
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get report owner: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Report with id {} not found", report_id)))
    }

    fn folder(&self, report_id: Uuid) -> PathBuf {
        self.images_dir.join(report_id.to_string())
    }

    async fn discard(&self, report_id: Uuid, names: &[String]) {
        let folder = self.folder(report_id);
        for name in names {
            if let Err(e) = self.storage.delete_image(&folder, name).await {
                tracing::warn!("Failed to remove report image '{}': {}", name, e);
            }
        }
    }
}
