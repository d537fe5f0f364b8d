use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::reports::models::Comment;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentResponseDto {
    pub id: Uuid,
    pub report_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponseDto {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            report_id: c.report_id,
            user_id: c.user_id,
            username: c.username,
            body: c.body,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCommentDto {
    #[validate(
        length(max = 2000, message = "Comment must be at most 2000 characters."),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub body: String,
}
