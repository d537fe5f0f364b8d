use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::CurrentHandler;
use crate::features::reports::dtos::{
    AcceptedReportDto, CreateResolutionDto, ResolutionSource, ResolvedReportDto,
    UpdateAssignmentProgressDto,
};
use crate::features::reports::lifecycle::{transition, ReportAction};
use crate::features::reports::models::{
    AssignmentStatus, HandlerAssignment, Report, ReportAssignment, ReportResolution,
    ReportStatus, ASSIGNMENT_COLUMNS, HANDLER_ASSIGNMENT_SELECT, REPORT_COLUMNS,
    RESOLUTION_COLUMNS,
};
use crate::shared::types::PaginationQuery;

/// Moderation and handling of reports: verification, assignment, resolution
pub struct HandlingService {
    pool: PgPool,
}

impl HandlingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Pending → Verified
    pub async fn verify(&self, report_id: Uuid) -> Result<Report> {
        let mut tx = self.begin().await?;

        let current = Self::lock_status_tx(&mut tx, report_id).await?;
        let next = transition(current, ReportAction::Verify)?;
        let report = Self::set_status_tx(&mut tx, report_id, next).await?;

        self.commit(tx).await?;
        tracing::info!("Report {} verified", report_id);
        Ok(report)
    }

    /// Append an assignment for `handler` and move the report to Assigned.
    ///
    /// Earlier assignments are kept as history.
    pub async fn accept(
        &self,
        report_id: Uuid,
        handler: &CurrentHandler,
    ) -> Result<AcceptedReportDto> {
        if !handler.approved {
            return Err(AppError::Forbidden(
                "Your account is awaiting approval by an administrator".to_string(),
            ));
        }

        let mut tx = self.begin().await?;

        let current = Self::lock_status_tx(&mut tx, report_id).await?;
        let next = transition(current, ReportAction::Accept)?;

        let assignment = sqlx::query_as::<_, ReportAssignment>(&format!(
            "INSERT INTO report_assignments (report_id, handler_id, status) \
             VALUES ($1, $2, $3) RETURNING {}",
            ASSIGNMENT_COLUMNS
        ))
        .bind(report_id)
        .bind(handler.id)
        .bind(AssignmentStatus::Assigned)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create assignment: {:?}", e);
            AppError::Database(e)
        })?;

        let report = Self::set_status_tx(&mut tx, report_id, next).await?;
        self.commit(tx).await?;

        if current == ReportStatus::Assigned {
            tracing::info!("Report {} reassigned to handler {}", report_id, handler.id);
        } else {
            tracing::info!("Report {} assigned to handler {}", report_id, handler.id);
        }

        Ok(AcceptedReportDto {
            report: report.into(),
            assignment: assignment.into(),
        })
    }

    /// Attach a resolution to the current assignment and close the report.
    ///
    /// Only the handler holding the current assignment may resolve.
    pub async fn resolve(
        &self,
        report_id: Uuid,
        handler: &CurrentHandler,
        source: ResolutionSource,
    ) -> Result<ResolvedReportDto> {
        let mut tx = self.begin().await?;

        let current = Self::lock_status_tx(&mut tx, report_id).await?;
        let next = transition(current, ReportAction::Resolve)?;

        let assignment = sqlx::query_as::<_, ReportAssignment>(&format!(
            "SELECT {} FROM report_assignments WHERE report_id = $1 \
             ORDER BY created_at DESC LIMIT 1 FOR UPDATE",
            ASSIGNMENT_COLUMNS
        ))
        .bind(report_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load current assignment: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::Conflict("Report has no assignment to resolve".to_string()))?;

        if assignment.handler_id != handler.id {
            return Err(AppError::Forbidden(
                "Only the handler currently assigned can resolve this report".to_string(),
            ));
        }

        let resolution = match source {
            ResolutionSource::Existing(id) => {
                let resolution = Self::get_resolution_tx(&mut tx, id).await?;
                if resolution.handler_id != handler.id {
                    return Err(AppError::Forbidden(
                        "This resolution was written by another handler".to_string(),
                    ));
                }
                resolution
            }
            ResolutionSource::New(details) => {
                Self::insert_resolution_tx(&mut tx, handler.id, details).await?
            }
        };

        let assignment = sqlx::query_as::<_, ReportAssignment>(&format!(
            r#"
            UPDATE report_assignments SET
                report_resolution_id = $2,
                status = $3,
                date_completed = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(assignment.id)
        .bind(resolution.id)
        .bind(AssignmentStatus::Completed)
        .bind(resolution.date_completed)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to complete assignment: {:?}", e);
            AppError::Database(e)
        })?;

        let report = Self::set_status_tx(&mut tx, report_id, next).await?;
        self.commit(tx).await?;

        tracing::info!(
            "Report {} resolved by handler {} (resolution {})",
            report_id,
            handler.id,
            resolution.id
        );

        Ok(ResolvedReportDto {
            report: report.into(),
            assignment: assignment.into(),
            resolution: resolution.into(),
        })
    }

    /// Record a resolution without attaching it yet
    pub async fn create_resolution(
        &self,
        handler_id: Uuid,
        dto: CreateResolutionDto,
    ) -> Result<ReportResolution> {
        let mut tx = self.begin().await?;
        let resolution = Self::insert_resolution_tx(&mut tx, handler_id, dto).await?;
        self.commit(tx).await?;
        Ok(resolution)
    }

    pub async fn get_resolution(&self, id: Uuid) -> Result<ReportResolution> {
        sqlx::query_as::<_, ReportResolution>(&format!(
            "SELECT {} FROM report_resolutions WHERE id = $1",
            RESOLUTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get resolution: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Resolution with id {} not found", id)))
    }

    pub async fn list_resolutions(&self, handler_id: Uuid) -> Result<Vec<ReportResolution>> {
        sqlx::query_as::<_, ReportResolution>(&format!(
            "SELECT {} FROM report_resolutions WHERE handler_id = $1 ORDER BY created_at DESC",
            RESOLUTION_COLUMNS
        ))
        .bind(handler_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list resolutions: {:?}", e);
            AppError::Database(e)
        })
    }

    /// Handling history of a report, newest first
    pub async fn list_assignments(&self, report_id: Uuid) -> Result<Vec<ReportAssignment>> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM reports WHERE id = $1)")
                .bind(report_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to check report: {:?}", e);
                    AppError::Database(e)
                })?;
        if !exists {
            return Err(AppError::NotFound(format!(
                "Report with id {} not found",
                report_id
            )));
        }

        sqlx::query_as::<_, ReportAssignment>(&format!(
            "SELECT {} FROM report_assignments WHERE report_id = $1 ORDER BY created_at DESC",
            ASSIGNMENT_COLUMNS
        ))
        .bind(report_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list assignments: {:?}", e);
            AppError::Database(e)
        })
    }

    /// A handler's work list, newest first
    pub async fn list_for_handler(
        &self,
        handler_id: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<HandlerAssignment>, i64)> {
        let assignments = sqlx::query_as::<_, HandlerAssignment>(&format!(
            "{} WHERE a.handler_id = $1 ORDER BY a.created_at DESC LIMIT $2 OFFSET $3",
            HANDLER_ASSIGNMENT_SELECT
        ))
        .bind(handler_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list handler assignments: {:?}", e);
            AppError::Database(e)
        })?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM report_assignments WHERE handler_id = $1",
        )
        .bind(handler_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count handler assignments: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((assignments, total))
    }

    /// Update status/estimate on the handler's own current assignment
    pub async fn update_progress(
        &self,
        handler_id: Uuid,
        assignment_id: Uuid,
        dto: UpdateAssignmentProgressDto,
    ) -> Result<ReportAssignment> {
        dto.check()?;

        let mut tx = self.begin().await?;

        let assignment = sqlx::query_as::<_, ReportAssignment>(&format!(
            "SELECT {} FROM report_assignments WHERE id = $1 FOR UPDATE",
            ASSIGNMENT_COLUMNS
        ))
        .bind(assignment_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load assignment: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| {
            AppError::NotFound(format!("Assignment with id {} not found", assignment_id))
        })?;

        if assignment.handler_id != handler_id {
            return Err(AppError::Forbidden(
                "This assignment belongs to another handler".to_string(),
            ));
        }
        if assignment.status == AssignmentStatus::Completed {
            return Err(AppError::Conflict(
                "Completed assignments cannot be changed".to_string(),
            ));
        }

        let latest = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM report_assignments WHERE report_id = $1 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(assignment.report_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load current assignment: {:?}", e);
            AppError::Database(e)
        })?;
        if latest != assignment.id {
            return Err(AppError::Conflict(
                "The report has been reassigned since".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, ReportAssignment>(&format!(
            r#"
            UPDATE report_assignments SET
                status = COALESCE($2, status),
                estimated_completion_date = COALESCE($3, estimated_completion_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(assignment.id)
        .bind(dto.status)
        .bind(dto.estimated_completion_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update assignment progress: {:?}", e);
            AppError::Database(e)
        })?;

        self.commit(tx).await?;
        Ok(updated)
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin transaction: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn commit(&self, tx: Transaction<'static, Postgres>) -> Result<()> {
        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit transaction: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn lock_status_tx(
        tx: &mut Transaction<'_, Postgres>,
        report_id: Uuid,
    ) -> Result<ReportStatus> {
        sqlx::query_scalar::<_, ReportStatus>("SELECT status FROM reports WHERE id = $1 FOR UPDATE")
            .bind(report_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to lock report: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Report with id {} not found", report_id)))
    }

    async fn set_status_tx(
        tx: &mut Transaction<'_, Postgres>,
        report_id: Uuid,
        status: ReportStatus,
    ) -> Result<Report> {
        sqlx::query_as::<_, Report>(&format!(
            "UPDATE reports SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            REPORT_COLUMNS
        ))
        .bind(report_id)
        .bind(status)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update report status: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn get_resolution_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<ReportResolution> {
        sqlx::query_as::<_, ReportResolution>(&format!(
            "SELECT {} FROM report_resolutions WHERE id = $1",
            RESOLUTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get resolution: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Resolution with id {} not found", id)))
    }

    async fn insert_resolution_tx(
        tx: &mut Transaction<'_, Postgres>,
        handler_id: Uuid,
        dto: CreateResolutionDto,
    ) -> Result<ReportResolution> {
        sqlx::query_as::<_, ReportResolution>(&format!(
            r#"
            INSERT INTO report_resolutions (
                handler_id, severity_level, initial_situation_description, steps_taken,
                recommendations, potential_causes, man_power_details, financial_costs,
                date_completed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            RESOLUTION_COLUMNS
        ))
        .bind(handler_id)
        .bind(dto.severity_level)
        .bind(dto.initial_situation_description.trim())
        .bind(dto.steps_taken.trim())
        .bind(dto.recommendations)
        .bind(dto.potential_causes)
        .bind(dto.man_power_details)
        .bind(dto.financial_costs)
        .bind(dto.date_completed)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert resolution: {:?}", e);
            AppError::Database(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::features::reports::dtos::CreateReportDto;
    use crate::features::reports::models::{OccurrencePeriod, Severity, WasteType};
    use crate::features::reports::services::geocoding_service::{Coordinates, Geocoder};
    use crate::features::reports::services::ReportService;
    use crate::shared::constants::{REPORT_SUBMISSION_POINTS, ROLE_REPORTER, STARTING_POINTS};
    use crate::shared::test_helpers::{seed_handler, seed_user, user_points};

    struct NoGeocoder;

    #[async_trait]
    impl Geocoder for NoGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<Coordinates>> {
            Ok(None)
        }
    }

    async fn submit(pool: &PgPool, user_id: Uuid) -> Uuid {
        ReportService::new(pool.clone(), Arc::new(NoGeocoder))
            .create(
                user_id,
                CreateReportDto {
                    location: "Dandora Dumpsite".to_string(),
                    latitude: Some(-1.2454),
                    longitude: Some(36.9012),
                    waste_type: WasteType::Hazardous,
                    description: "Smoke from burning tyres".to_string(),
                    severity: Severity::High,
                    period_of_occurrence: OccurrencePeriod::LastThreeDays,
                    categories: vec![],
                },
            )
            .await
            .unwrap()
            .report
            .report
            .id
    }

    fn details() -> CreateResolutionDto {
        CreateResolutionDto {
            severity_level: Severity::Moderate,
            initial_situation_description: " Burning heap at the gate ".to_string(),
            steps_taken: "Fire doused and waste carted away".to_string(),
            recommendations: Some("Weekly patrols".to_string()),
            potential_causes: None,
            man_power_details: Some("Six crew members".to_string()),
            financial_costs: None,
            date_completed: NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_report_runs_through_full_lifecycle(pool: PgPool) {
        let citizen = seed_user(&pool, ROLE_REPORTER).await;
        let staff = seed_handler(&pool, true).await;
        let service = HandlingService::new(pool.clone());

        let report_id = submit(&pool, citizen).await;
        assert_eq!(
            user_points(&pool, citizen).await,
            STARTING_POINTS + REPORT_SUBMISSION_POINTS
        );

        let verified = service.verify(report_id).await.unwrap();
        assert_eq!(verified.status, ReportStatus::Verified);

        let accepted = service.accept(report_id, &staff).await.unwrap();
        assert_eq!(accepted.report.status, ReportStatus::Assigned);
        assert_eq!(accepted.assignment.handler_id, staff.id);
        assert_eq!(accepted.assignment.status, AssignmentStatus::Assigned);

        let resolved = service
            .resolve(report_id, &staff, ResolutionSource::New(details()))
            .await
            .unwrap();
        assert_eq!(resolved.report.status, ReportStatus::Resolved);
        assert_eq!(resolved.assignment.status, AssignmentStatus::Completed);
        assert_eq!(resolved.assignment.report_resolution_id, Some(resolved.resolution.id));
        assert_eq!(resolved.assignment.date_completed, Some(details().date_completed));
        assert_eq!(
            resolved.resolution.initial_situation_description,
            "Burning heap at the gate"
        );

        // Resolved is terminal
        assert!(matches!(
            service.accept(report_id, &staff).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            service.verify(report_id).await,
            Err(AppError::Conflict(_))
        ));

        let (work, total) = service
            .list_for_handler(staff.id, &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(work[0].report_status, ReportStatus::Resolved);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_only_latest_assignee_can_resolve_after_reassignment(pool: PgPool) {
        let citizen = seed_user(&pool, ROLE_REPORTER).await;
        let first = seed_handler(&pool, true).await;
        let second = seed_handler(&pool, true).await;
        let service = HandlingService::new(pool.clone());
        let report_id = submit(&pool, citizen).await;

        let earlier = service.accept(report_id, &first).await.unwrap().assignment;
        let later = service.accept(report_id, &second).await.unwrap().assignment;

        let history = service.list_assignments(report_id).await.unwrap();
        let order: Vec<Uuid> = history.iter().map(|a| a.id).collect();
        assert_eq!(order, vec![later.id, earlier.id]);

        let err = service
            .resolve(report_id, &first, ResolutionSource::New(details()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Nothing was written by the rejected attempt
        assert!(service.list_resolutions(first.id).await.unwrap().is_empty());
        let all_open = service
            .list_assignments(report_id)
            .await
            .unwrap()
            .into_iter()
            .all(|a| a.status == AssignmentStatus::Assigned);
        assert!(all_open);

        // The superseded assignment cannot be progressed either
        let progress = UpdateAssignmentProgressDto {
            status: Some(AssignmentStatus::InProgress),
            estimated_completion_date: None,
        };
        assert!(matches!(
            service.update_progress(first.id, earlier.id, progress.clone()).await,
            Err(AppError::Conflict(_))
        ));
        let updated = service
            .update_progress(second.id, later.id, progress)
            .await
            .unwrap();
        assert_eq!(updated.status, AssignmentStatus::InProgress);

        let resolved = service
            .resolve(report_id, &second, ResolutionSource::New(details()))
            .await
            .unwrap();
        assert_eq!(resolved.assignment.id, later.id);

        let history = service.list_assignments(report_id).await.unwrap();
        assert_eq!(history[0].status, AssignmentStatus::Completed);
        assert_eq!(history[1].status, AssignmentStatus::Assigned);
        assert_eq!(history[1].report_resolution_id, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_resolve_with_existing_resolution_checks_author(pool: PgPool) {
        let citizen = seed_user(&pool, ROLE_REPORTER).await;
        let assignee = seed_handler(&pool, true).await;
        let other = seed_handler(&pool, true).await;
        let service = HandlingService::new(pool.clone());
        let report_id = submit(&pool, citizen).await;
        service.accept(report_id, &assignee).await.unwrap();

        let foreign = service.create_resolution(other.id, details()).await.unwrap();
        assert!(matches!(
            service
                .resolve(report_id, &assignee, ResolutionSource::Existing(foreign.id))
                .await,
            Err(AppError::Forbidden(_))
        ));

        let own = service.create_resolution(assignee.id, details()).await.unwrap();
        let resolved = service
            .resolve(report_id, &assignee, ResolutionSource::Existing(own.id))
            .await
            .unwrap();
        assert_eq!(resolved.resolution.id, own.id);
        assert_eq!(resolved.report.status, ReportStatus::Resolved);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_illegal_transitions_are_conflicts(pool: PgPool) {
        let citizen = seed_user(&pool, ROLE_REPORTER).await;
        let staff = seed_handler(&pool, true).await;
        let service = HandlingService::new(pool.clone());
        let report_id = submit(&pool, citizen).await;

        // Pending report has nothing to resolve
        assert!(matches!(
            service
                .resolve(report_id, &staff, ResolutionSource::New(details()))
                .await,
            Err(AppError::Conflict(_))
        ));

        service.verify(report_id).await.unwrap();
        assert!(matches!(
            service.verify(report_id).await,
            Err(AppError::Conflict(_))
        ));

        assert!(matches!(
            service.verify(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_unapproved_handler_cannot_accept(pool: PgPool) {
        let citizen = seed_user(&pool, ROLE_REPORTER).await;
        let pending_staff = seed_handler(&pool, false).await;
        let service = HandlingService::new(pool.clone());
        let report_id = submit(&pool, citizen).await;

        assert!(matches!(
            service.accept(report_id, &pending_staff).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(service.list_assignments(report_id).await.unwrap().is_empty());
    }
}
