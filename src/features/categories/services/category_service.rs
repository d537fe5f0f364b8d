use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::map_write_error;
use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{CreateCategoryDto, UpdateCategoryDto};
use crate::features::categories::models::{Category, CATEGORY_COLUMNS};

const DUPLICATE_NAME: &str = "A category with this name already exists";

/// Service for category operations
pub struct CategoryService {
    pool: PgPool,
}

impl CategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all categories by name
    pub async fn list(&self) -> Result<Vec<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories ORDER BY name",
            CATEGORY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list categories: {:?}", e);
            AppError::Database(e)
        })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Category> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories WHERE id = $1",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get category: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))
    }

    pub async fn create(&self, dto: CreateCategoryDto) -> Result<Category> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING {}",
            CATEGORY_COLUMNS
        ))
        .bind(dto.name.trim())
        .bind(dto.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to create category", DUPLICATE_NAME))?;

        tracing::info!("Category '{}' created", category.name);
        Ok(category)
    }

    pub async fn update(&self, id: Uuid, dto: UpdateCategoryDto) -> Result<Category> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to update category", DUPLICATE_NAME))?
        .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))
    }

    /// Delete a category together with its report links
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete category: {:?}", e);
                AppError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Category with id {} not found",
                id
            )));
        }

        tracing::info!("Category {} deleted", id);
        Ok(())
    }
}
