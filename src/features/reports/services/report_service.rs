use std::sync::Arc;

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::Principal;
use crate::features::reports::dtos::{
    paired_coordinates, CreateReportDto, CreatedReportDto, ReportDetailDto, UpdateReportDto,
};
use crate::features::reports::models::{
    NewReport, Report, ReportAssignment, ReportCategory, ReportImage, ReportStatus,
    ASSIGNMENT_COLUMNS, REPORT_CATEGORY_SELECT, REPORT_COLUMNS, REPORT_IMAGE_COLUMNS,
};
use crate::features::reports::services::geocoding_service::{locate, Geocoder};
use crate::features::rewards::RewardService;
use crate::features::roles::models::Permission;
use crate::shared::constants::{LATEST_REPORTS_LIMIT, REPORT_SUBMISSION_POINTS};
use crate::shared::types::PaginationQuery;

/// Report submission, editing and retrieval
pub struct ReportService {
    pool: PgPool,
    geocoder: Arc<dyn Geocoder>,
}

impl ReportService {
    pub fn new(pool: PgPool, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { pool, geocoder }
    }

    /// Submit a report.
    ///
    /// Coordinates are geocoded from the location when not supplied; a failed
    /// lookup stores the report without them and adds a warning. The insert,
    /// category links, points and reward grants commit together.
    pub async fn create(&self, user_id: Uuid, dto: CreateReportDto) -> Result<CreatedReportDto> {
        let mut warnings = Vec::new();
        let location = dto.location.trim().to_string();

        let (latitude, longitude) = match paired_coordinates(dto.latitude, dto.longitude)? {
            Some((lat, lon)) => (Some(lat), Some(lon)),
            None => {
                let (found, warning) = locate(self.geocoder.as_ref(), &location).await;
                warnings.extend(warning);
                (found.map(|c| c.latitude), found.map(|c| c.longitude))
            }
        };

        let new_report = NewReport {
            user_id,
            location,
            latitude,
            longitude,
            waste_type: dto.waste_type,
            description: dto.description.trim().to_string(),
            severity: dto.severity,
            period_of_occurrence: dto.period_of_occurrence,
        };

        let mut tx = self.begin().await?;

        let report = Self::insert_tx(&mut tx, new_report).await?;
        Self::ensure_categories_exist_tx(&mut tx, &dto.categories).await?;
        for category_id in &dto.categories {
            Self::link_category_tx(&mut tx, report.id, *category_id).await?;
        }
        let granted =
            RewardService::award_points_tx(&mut tx, user_id, REPORT_SUBMISSION_POINTS).await?;

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit report creation: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Report {} submitted by user {} ({} categories, {} rewards granted)",
            report.id,
            user_id,
            dto.categories.len(),
            granted.len()
        );

        Ok(CreatedReportDto {
            report: self.detail(report).await?,
            points_awarded: REPORT_SUBMISSION_POINTS,
            rewards_granted: granted.into_iter().map(Into::into).collect(),
            warnings,
        })
    }

    /// Owner edit while the report is still pending
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        dto: UpdateReportDto,
    ) -> Result<(ReportDetailDto, Vec<String>)> {
        let current = self.get_by_id(id).await?;

        if current.user_id != user_id {
            return Err(AppError::Forbidden(
                "You can only edit your own reports".to_string(),
            ));
        }
        if current.status != ReportStatus::Pending {
            return Err(AppError::Conflict(
                "Only pending reports can be edited".to_string(),
            ));
        }

        let mut warnings = Vec::new();
        let location = dto.location.as_deref().map(str::trim);

        let (latitude, longitude) = match paired_coordinates(dto.latitude, dto.longitude)? {
            Some((lat, lon)) => (Some(lat), Some(lon)),
            None => match location {
                Some(new_location) if new_location != current.location => {
                    let (found, warning) = locate(self.geocoder.as_ref(), new_location).await;
                    warnings.extend(warning);
                    (found.map(|c| c.latitude), found.map(|c| c.longitude))
                }
                _ => (current.latitude, current.longitude),
            },
        };

        let report = sqlx::query_as::<_, Report>(&format!(
            r#"
            UPDATE reports SET
                location = COALESCE($2, location),
                latitude = $3,
                longitude = $4,
                waste_type = COALESCE($5, waste_type),
                description = COALESCE($6, description),
                severity = COALESCE($7, severity),
                period_of_occurrence = COALESCE($8, period_of_occurrence),
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            REPORT_COLUMNS
        ))
        .bind(id)
        .bind(location)
        .bind(latitude)
        .bind(longitude)
        .bind(dto.waste_type)
        .bind(dto.description.as_deref().map(str::trim))
        .bind(dto.severity)
        .bind(dto.period_of_occurrence)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update report: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::Conflict("Only pending reports can be edited".to_string()))?;

        Ok((self.detail(report).await?, warnings))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Report> {
        sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM reports WHERE id = $1",
            REPORT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get report: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Report with id {} not found", id)))
    }

    pub async fn get_detail(&self, id: Uuid) -> Result<ReportDetailDto> {
        let report = self.get_by_id(id).await?;
        self.detail(report).await
    }

    /// Most recent submissions across all citizens
    pub async fn list_latest(&self) -> Result<Vec<Report>> {
        sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM reports ORDER BY created_at DESC LIMIT $1",
            REPORT_COLUMNS
        ))
        .bind(LATEST_REPORTS_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list latest reports: {:?}", e);
            AppError::Database(e)
        })
    }

    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<Report>, i64)> {
        self.list_where("user_id = $1", user_id, pagination).await
    }

    /// Reports the handler has ever been assigned to
    pub async fn list_by_handler(
        &self,
        handler_id: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<Report>, i64)> {
        self.list_where(
            "id IN (SELECT report_id FROM report_assignments WHERE handler_id = $1)",
            handler_id,
            pagination,
        )
        .await
    }

    async fn list_where(
        &self,
        condition: &str,
        owner: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<Report>, i64)> {
        let reports = sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM reports WHERE {} ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            REPORT_COLUMNS, condition
        ))
        .bind(owner)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list reports: {:?}", e);
            AppError::Database(e)
        })?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM reports WHERE {}",
            condition
        ))
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count reports: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((reports, total))
    }

    /// Link a category to a report; allowed for the author and moderators
    pub async fn assign_category(
        &self,
        principal: &Principal,
        report_id: Uuid,
        category_id: Uuid,
    ) -> Result<ReportCategory> {
        let report = self.get_by_id(report_id).await?;

        let is_author = principal.id() == Some(report.user_id);
        if !is_author && !principal.can(Permission::MODERATE) {
            return Err(AppError::Forbidden(
                "Only the author or a moderator can categorize this report".to_string(),
            ));
        }

        let mut tx = self.begin().await?;
        Self::ensure_categories_exist_tx(&mut tx, &[category_id]).await?;
        let link_id = Self::link_category_tx(&mut tx, report_id, category_id).await?;
        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit category link: {:?}", e);
            AppError::Database(e)
        })?;

        sqlx::query_as::<_, ReportCategory>(&format!("{} WHERE rc.id = $1", REPORT_CATEGORY_SELECT))
            .bind(link_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load category link: {:?}", e);
                AppError::Database(e)
            })
    }

    pub async fn list_categories(&self, report_id: Uuid) -> Result<Vec<ReportCategory>> {
        sqlx::query_as::<_, ReportCategory>(&format!(
            "{} WHERE rc.report_id = $1 ORDER BY rc.created_at",
            REPORT_CATEGORY_SELECT
        ))
        .bind(report_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list report categories: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn detail(&self, report: Report) -> Result<ReportDetailDto> {
        let categories = self.list_categories(report.id).await?;

        let images = sqlx::query_as::<_, ReportImage>(&format!(
            "SELECT {} FROM report_images WHERE report_id = $1 ORDER BY created_at",
            REPORT_IMAGE_COLUMNS
        ))
        .bind(report.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list report images: {:?}", e);
            AppError::Database(e)
        })?;

        let current_assignment = sqlx::query_as::<_, ReportAssignment>(&format!(
            "SELECT {} FROM report_assignments WHERE report_id = $1 \
             ORDER BY created_at DESC LIMIT 1",
            ASSIGNMENT_COLUMNS
        ))
        .bind(report.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load current assignment: {:?}", e);
            AppError::Database(e)
        })?;

        let comment_count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE report_id = $1")
                .bind(report.id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to count comments: {:?}", e);
                    AppError::Database(e)
                })?;

        Ok(ReportDetailDto {
            report: report.into(),
            categories: categories.into_iter().map(Into::into).collect(),
            images: images.into_iter().map(Into::into).collect(),
            current_assignment: current_assignment.map(Into::into),
            comment_count,
        })
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin transaction: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn insert_tx(tx: &mut Transaction<'_, Postgres>, new: NewReport) -> Result<Report> {
        sqlx::query_as::<_, Report>(&format!(
            r#"
            INSERT INTO reports
                (user_id, location, latitude, longitude, waste_type, description, severity, period_of_occurrence)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            REPORT_COLUMNS
        ))
        .bind(new.user_id)
        .bind(new.location)
        .bind(new.latitude)
        .bind(new.longitude)
        .bind(new.waste_type)
        .bind(new.description)
        .bind(new.severity)
        .bind(new.period_of_occurrence)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert report: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn ensure_categories_exist_tx(
        tx: &mut Transaction<'_, Postgres>,
        category_ids: &[Uuid],
    ) -> Result<()> {
        if category_ids.is_empty() {
            return Ok(());
        }

        let mut wanted = category_ids.to_vec();
        wanted.sort();
        wanted.dedup();

        let found = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE id = ANY($1)",
        )
        .bind(&wanted)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check categories: {:?}", e);
            AppError::Database(e)
        })?;

        if found != wanted.len() as i64 {
            return Err(AppError::field("categories", "Unknown category."));
        }
        Ok(())
    }

    async fn link_category_tx(
        tx: &mut Transaction<'_, Postgres>,
        report_id: Uuid,
        category_id: Uuid,
    ) -> Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO report_categories (report_id, category_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(report_id)
        .bind(category_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to link category: {:?}", e);
            AppError::Database(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::core::error::field_messages;
    use crate::features::reports::models::{OccurrencePeriod, Severity, WasteType};
    use crate::features::reports::services::geocoding_service::{
        Coordinates, GEOCODING_FAILED_WARNING,
    };
    use crate::shared::constants::{ROLE_REPORTER, STARTING_POINTS};
    use crate::shared::test_helpers::{category_ids, seed_user, user_points};

    const GIKOMBA: Coordinates = Coordinates {
        latitude: -1.2841,
        longitude: 36.8365,
    };

    struct FixedGeocoder;

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<Coordinates>> {
            Ok(Some(GIKOMBA))
        }
    }

    struct UnreachableGeocoder;

    #[async_trait]
    impl Geocoder for UnreachableGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<Coordinates>> {
            Err(AppError::ExternalServiceError(
                "Nominatim is unreachable".to_string(),
            ))
        }
    }

    fn submission(categories: Vec<Uuid>) -> CreateReportDto {
        CreateReportDto {
            location: "  Gikomba Market, Nairobi ".to_string(),
            latitude: None,
            longitude: None,
            waste_type: WasteType::Plastic,
            description: "Plastic bags blocking the drainage".to_string(),
            severity: Severity::High,
            period_of_occurrence: OccurrencePeriod::LastWeek,
            categories,
        }
    }

    async fn report_count(pool: &PgPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM reports")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_links_categories_and_awards_points(pool: PgPool) {
        sqlx::query("INSERT INTO rewards (name, points_required) VALUES ('Bronze', 15), ('Silver', 100)")
            .execute(&pool)
            .await
            .unwrap();
        let user_id = seed_user(&pool, ROLE_REPORTER).await;
        let ids = category_ids(&pool, 2).await;
        let service = ReportService::new(pool.clone(), Arc::new(FixedGeocoder));

        let created = service
            .create(user_id, submission(vec![ids[0], ids[1], ids[0]]))
            .await
            .unwrap();

        let report = &created.report.report;
        assert_eq!(report.location, "Gikomba Market, Nairobi");
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.latitude, Some(GIKOMBA.latitude));
        assert_eq!(report.longitude, Some(GIKOMBA.longitude));
        assert!(created.warnings.is_empty());

        // Duplicate links are kept
        let linked: Vec<Uuid> = created.report.categories.iter().map(|c| c.category_id).collect();
        assert_eq!(linked.len(), 3);
        assert_eq!(linked.iter().filter(|id| **id == ids[0]).count(), 2);

        assert_eq!(created.points_awarded, REPORT_SUBMISSION_POINTS);
        assert_eq!(
            user_points(&pool, user_id).await,
            STARTING_POINTS + REPORT_SUBMISSION_POINTS
        );
        let granted: Vec<&str> = created.rewards_granted.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(granted, vec!["Bronze"]);

        // A second report does not grant Bronze again
        let again = service.create(user_id, submission(vec![])).await.unwrap();
        assert!(again.rewards_granted.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_stores_report_when_geocoding_fails(pool: PgPool) {
        let user_id = seed_user(&pool, ROLE_REPORTER).await;
        let service = ReportService::new(pool.clone(), Arc::new(UnreachableGeocoder));

        let created = service.create(user_id, submission(vec![])).await.unwrap();

        assert_eq!(created.warnings, vec![GEOCODING_FAILED_WARNING.to_string()]);
        assert_eq!(created.report.report.latitude, None);
        assert_eq!(created.report.report.longitude, None);
        assert_eq!(report_count(&pool).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_supplied_coordinates_skip_geocoding(pool: PgPool) {
        let user_id = seed_user(&pool, ROLE_REPORTER).await;
        let service = ReportService::new(pool.clone(), Arc::new(UnreachableGeocoder));

        let mut dto = submission(vec![]);
        dto.latitude = Some(-4.05);
        dto.longitude = Some(39.66);
        let created = service.create(user_id, dto).await.unwrap();

        assert!(created.warnings.is_empty());
        assert_eq!(created.report.report.latitude, Some(-4.05));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_unknown_category_rolls_back_everything(pool: PgPool) {
        let user_id = seed_user(&pool, ROLE_REPORTER).await;
        let known = category_ids(&pool, 1).await;
        let service = ReportService::new(pool.clone(), Arc::new(FixedGeocoder));

        let err = service
            .create(user_id, submission(vec![known[0], Uuid::new_v4()]))
            .await
            .unwrap_err();

        match err {
            AppError::InvalidFields(ref errors) => {
                assert_eq!(
                    field_messages(errors),
                    vec!["categories: Unknown category.".to_string()]
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(report_count(&pool).await, 0);
        assert_eq!(user_points(&pool, user_id).await, STARTING_POINTS);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_keeps_categories_and_regeocodes_new_location(pool: PgPool) {
        let user_id = seed_user(&pool, ROLE_REPORTER).await;
        let ids = category_ids(&pool, 3).await;
        let service = ReportService::new(pool.clone(), Arc::new(FixedGeocoder));

        let mut dto = submission(ids.clone());
        dto.latitude = Some(-1.0);
        dto.longitude = Some(36.0);
        let created = service.create(user_id, dto).await.unwrap();
        let id = created.report.report.id;

        let (updated, warnings) = service
            .update(
                user_id,
                id,
                UpdateReportDto {
                    location: Some("Muthurwa Market".to_string()),
                    description: Some("Now spilling onto the road".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(warnings.is_empty());
        assert_eq!(updated.report.location, "Muthurwa Market");
        assert_eq!(updated.report.description, "Now spilling onto the road");
        assert_eq!(updated.report.latitude, Some(GIKOMBA.latitude));
        assert_eq!(updated.report.severity, Severity::High);

        let mut linked: Vec<Uuid> = updated.categories.iter().map(|c| c.category_id).collect();
        let mut expected = ids;
        linked.sort();
        expected.sort();
        assert_eq!(linked, expected);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_limited_to_owner_while_pending(pool: PgPool) {
        let owner = seed_user(&pool, ROLE_REPORTER).await;
        let stranger = seed_user(&pool, ROLE_REPORTER).await;
        let service = ReportService::new(pool.clone(), Arc::new(FixedGeocoder));
        let id = service
            .create(owner, submission(vec![]))
            .await
            .unwrap()
            .report
            .report
            .id;

        let edit = || UpdateReportDto {
            description: Some("Edited".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            service.update(stranger, id, edit()).await,
            Err(AppError::Forbidden(_))
        ));

        sqlx::query("UPDATE reports SET status = 'verified' WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
        assert!(matches!(
            service.update(owner, id, edit()).await,
            Err(AppError::Conflict(_))
        ));
    }
}
