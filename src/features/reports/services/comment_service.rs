use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::map_write_error;
use crate::core::error::{AppError, Result};
use crate::features::reports::dtos::CreateCommentDto;
use crate::features::reports::models::{Comment, COMMENT_SELECT};

/// Discussion thread under a report
pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Oldest first
    pub async fn list(&self, report_id: Uuid) -> Result<Vec<Comment>> {
        self.ensure_report_exists(report_id).await?;

        sqlx::query_as::<_, Comment>(&format!(
            "{} WHERE c.report_id = $1 ORDER BY c.created_at ASC",
            COMMENT_SELECT
        ))
        .bind(report_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list comments: {:?}", e);
            AppError::Database(e)
        })
    }

    pub async fn create(
        &self,
        report_id: Uuid,
        user_id: Uuid,
        dto: CreateCommentDto,
    ) -> Result<Comment> {
        self.ensure_report_exists(report_id).await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO comments (report_id, user_id, body) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(report_id)
        .bind(user_id)
        .bind(dto.body.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "create comment", "Duplicate comment"))?;

        sqlx::query_as::<_, Comment>(&format!("{} WHERE c.id = $1", COMMENT_SELECT))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load comment: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn ensure_report_exists(&self, report_id: Uuid) -> Result<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM reports WHERE id = $1)")
                .bind(report_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to check report: {:?}", e);
                    AppError::Database(e)
                })?;

        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "Report with id {} not found",
                report_id
            )))
        }
    }
}
