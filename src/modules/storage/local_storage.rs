//! Local filesystem storage for uploaded images
//!
//! Files are written under a configured folder with a random name that keeps
//! the original extension. Callers store only the returned file name.

use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::shared::constants::ALLOWED_IMAGE_EXTENSIONS;

/// An image read from a multipart request, not yet persisted
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Image storage rooted in local folders
pub struct LocalStorage {
    max_image_size: usize,
}

/// Whether the file name carries one of the accepted image extensions
pub fn is_allowed_file(file_name: &str) -> bool {
    extension(file_name).is_some_and(|ext| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

impl LocalStorage {
    pub fn new(max_image_size: usize) -> Self {
        Self { max_image_size }
    }

    pub fn max_image_size(&self) -> usize {
        self.max_image_size
    }

    /// Check name and size of an upload before anything touches the disk
    pub fn validate(&self, image: &UploadedImage) -> Result<(), AppError> {
        if image.data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }

        if image.data.len() > self.max_image_size {
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                self.max_image_size,
                self.max_image_size / 1024 / 1024
            )));
        }

        if !is_allowed_file(&image.file_name) {
            return Err(AppError::BadRequest(format!(
                "File type is not allowed. Allowed extensions: {}",
                ALLOWED_IMAGE_EXTENSIONS.join(", ")
            )));
        }

        Ok(())
    }

    /// Persist an image into `folder` and return the generated file name
    pub async fn save_image(&self, image: &UploadedImage, folder: &Path) -> Result<String, AppError> {
        self.validate(image)?;

        let ext = extension(&image.file_name).unwrap_or_default();
        let stored_name = format!("{}.{}", Uuid::new_v4().simple(), ext);

        tokio::fs::create_dir_all(folder).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to create upload folder '{}': {}",
                folder.display(),
                e
            ))
        })?;

        let path = folder.join(&stored_name);
        tokio::fs::write(&path, &image.data).await.map_err(|e| {
            AppError::Internal(format!("Failed to write file '{}': {}", path.display(), e))
        })?;

        debug!("Stored image '{}' as '{}'", image.file_name, path.display());
        Ok(stored_name)
    }

    /// Remove a stored image; a file that is already gone is not an error
    pub async fn delete_image(&self, folder: &Path, file_name: &str) -> Result<(), AppError> {
        let path = Self::resolve(folder, file_name)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted image '{}'", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Image '{}' already removed", path.display());
                Ok(())
            }
            Err(e) => Err(AppError::Internal(format!(
                "Failed to delete file '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn resolve(folder: &Path, file_name: &str) -> Result<PathBuf, AppError> {
        // Stored names are generated by save_image and never contain separators
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name.contains("..")
        {
            return Err(AppError::BadRequest("Invalid file name".to_string()));
        }
        Ok(folder.join(file_name))
    }
}

/// Collect every file field of a multipart body.
///
/// Non-file fields are ignored.
pub async fn read_images(multipart: &mut Multipart) -> Result<Vec<UploadedImage>, AppError> {
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
            debug!("Ignoring non-file field: {}", field.name().unwrap_or(""));
            continue;
        };

        let data = field.bytes().await.map_err(|e| {
            debug!("Failed to read file bytes: {}", e);
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        images.push(UploadedImage {
            file_name,
            data: data.to_vec(),
        });
    }

    Ok(images)
}

/// Read exactly one uploaded image
pub async fn read_single_image(multipart: &mut Multipart) -> Result<UploadedImage, AppError> {
    read_images(multipart)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::BadRequest("File is required".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str, size: usize) -> UploadedImage {
        UploadedImage {
            file_name: name.to_string(),
            data: vec![0u8; size],
        }
    }

    fn temp_folder() -> PathBuf {
        std::env::temp_dir().join(format!("ripoti-storage-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_is_allowed_file() {
        assert!(is_allowed_file("dump.jpg"));
        assert!(is_allowed_file("DUMP.PNG"));
        assert!(is_allowed_file("site.photo.webp"));
        assert!(is_allowed_file("scan.avif"));
        assert!(!is_allowed_file("notes.txt"));
        assert!(!is_allowed_file("jpg"));
        assert!(!is_allowed_file(".png"));
        assert!(!is_allowed_file("trailing."));
    }

    #[test]
    fn test_validate_rejects_oversized_and_empty() {
        let storage = LocalStorage::new(10);
        assert!(storage.validate(&image("a.png", 10)).is_ok());
        assert!(matches!(
            storage.validate(&image("a.png", 11)),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            storage.validate(&image("a.png", 0)),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            storage.validate(&image("a.exe", 5)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_save_and_delete_image() {
        let storage = LocalStorage::new(1024);
        let folder = temp_folder();

        let name = storage
            .save_image(&image("pile.JPG", 16), &folder)
            .await
            .unwrap();
        assert!(name.ends_with(".jpg"));
        assert!(folder.join(&name).exists());

        storage.delete_image(&folder, &name).await.unwrap();
        assert!(!folder.join(&name).exists());

        // Deleting twice is fine
        storage.delete_image(&folder, &name).await.unwrap();

        let _ = std::fs::remove_dir_all(&folder);
    }

    #[tokio::test]
    async fn test_delete_rejects_path_traversal() {
        let storage = LocalStorage::new(1024);
        let result = storage
            .delete_image(Path::new("/tmp"), "../etc/passwd")
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
