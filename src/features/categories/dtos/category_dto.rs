use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::categories::models::Category;

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryDto {
    #[validate(
        length(min = 1, max = 100, message = "Name must be between 1 and 100 characters."),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters."))]
    pub description: Option<String>,
}

/// Partial update; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryDto {
    #[validate(
        length(min = 1, max = 100, message = "Name must be between 1 and 100 characters."),
        custom(function = "crate::shared::validation::not_blank")
    )]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters."))]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_category_requires_name() {
        let blank = CreateCategoryDto {
            name: "  ".to_string(),
            description: None,
        };
        assert!(blank.validate().is_err());

        let ok = CreateCategoryDto {
            name: "Plastic".to_string(),
            description: Some("Bottles and bags".to_string()),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_long_description_rejected() {
        let dto = UpdateCategoryDto {
            name: None,
            description: Some("x".repeat(501)),
        };
        assert!(dto.validate().is_err());
    }
}
