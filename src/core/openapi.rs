use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth::session::SESSION_COOKIE;
use crate::features::auth::{dtos as auth_dtos, handlers as auth_handlers, PrincipalKind};
use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::reports::{
    dtos as reports_dtos, handlers as reports_handlers, models as reports_models,
    services::geocoding_service::Coordinates,
};
use crate::features::rewards::{dtos as rewards_dtos, handlers as rewards_handlers};
use crate::features::roles::{dtos as roles_dtos, handlers as roles_handlers};
use crate::features::staff::{dtos as staff_dtos, handlers as staff_handlers};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth_handlers::auth_handler::register_user,
        auth_handlers::auth_handler::register_handler,
        auth_handlers::auth_handler::login_form,
        auth_handlers::auth_handler::login,
        auth_handlers::auth_handler::logout,
        auth_handlers::auth_handler::confirm,
        auth_handlers::auth_handler::resend_confirmation,
        auth_handlers::auth_handler::request_password_reset,
        auth_handlers::auth_handler::reset_password,
        auth_handlers::auth_handler::me,
        auth_handlers::auth_handler::change_password,
        auth_handlers::auth_handler::change_email,
        auth_handlers::auth_handler::reauthenticate,
        auth_handlers::oauth_handler::authorize,
        auth_handlers::oauth_handler::callback,
        // Users
        users_handlers::profile_handler::get_profile,
        users_handlers::profile_handler::update_phone,
        users_handlers::profile_handler::upload_image,
        users_handlers::profile_handler::remove_image,
        users_handlers::admin_handler::list_users,
        users_handlers::admin_handler::get_user,
        users_handlers::admin_handler::set_active,
        users_handlers::admin_handler::set_role,
        // Staff
        staff_handlers::profile_handler::get_profile,
        staff_handlers::profile_handler::update_profile,
        staff_handlers::profile_handler::upload_image,
        staff_handlers::profile_handler::remove_image,
        staff_handlers::admin_handler::list_handlers,
        staff_handlers::admin_handler::get_handler,
        staff_handlers::admin_handler::set_approval,
        staff_handlers::admin_handler::set_role,
        // Roles
        roles_handlers::role_handler::list_roles,
        roles_handlers::role_handler::update_role_permissions,
        // Categories
        categories_handlers::category_handler::list_categories,
        categories_handlers::category_handler::get_category,
        categories_handlers::category_handler::create_category,
        categories_handlers::category_handler::update_category,
        categories_handlers::category_handler::delete_category,
        // Reports
        reports_handlers::report_handler::create_report,
        reports_handlers::report_handler::latest_reports,
        reports_handlers::report_handler::my_reports,
        reports_handlers::report_handler::user_reports,
        reports_handlers::report_handler::handler_reports,
        reports_handlers::report_handler::get_report,
        reports_handlers::report_handler::update_report,
        reports_handlers::report_handler::list_categories,
        reports_handlers::report_handler::assign_category,
        reports_handlers::image_handler::list_images,
        reports_handlers::image_handler::upload_images,
        // Comments
        reports_handlers::comment_handler::list_comments,
        reports_handlers::comment_handler::create_comment,
        // Handling
        reports_handlers::handling_handler::verify_report,
        reports_handlers::handling_handler::accept_report,
        reports_handlers::handling_handler::resolve_report,
        reports_handlers::handling_handler::list_assignments,
        reports_handlers::handling_handler::my_assignments,
        reports_handlers::handling_handler::update_progress,
        reports_handlers::handling_handler::my_resolutions,
        reports_handlers::handling_handler::create_resolution,
        reports_handlers::handling_handler::get_resolution,
        // Rewards
        rewards_handlers::reward_handler::list_rewards,
        rewards_handlers::reward_handler::my_rewards,
        rewards_handlers::reward_handler::create_reward,
        rewards_handlers::reward_handler::get_reward,
        rewards_handlers::reward_handler::update_reward,
        rewards_handlers::reward_handler::delete_reward,
        rewards_handlers::reward_handler::grant_reward,
        rewards_handlers::reward_handler::revoke_reward,
        rewards_handlers::reward_handler::user_rewards,
    ),
    components(
        schemas(
            Meta,
            PrincipalKind,
            // Auth
            auth_dtos::RegisterUserDto,
            auth_dtos::RegisterHandlerDto,
            auth_dtos::LoginDto,
            auth_dtos::LoginResponseDto,
            auth_dtos::LoginFormDto,
            auth_dtos::PasswordResetRequestDto,
            auth_dtos::PasswordResetDto,
            auth_dtos::ChangePasswordDto,
            auth_dtos::ChangeEmailDto,
            auth_dtos::MeResponseDto,
            ApiResponse<auth_dtos::LoginResponseDto>,
            ApiResponse<auth_dtos::MeResponseDto>,
            // Users & staff
            users_dtos::UserResponseDto,
            users_dtos::UpdatePhoneDto,
            users_dtos::SetUserActiveDto,
            users_dtos::SetRoleDto,
            staff_dtos::HandlerResponseDto,
            staff_dtos::UpdateHandlerProfileDto,
            staff_dtos::SetHandlerApprovalDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<Vec<users_dtos::UserResponseDto>>,
            ApiResponse<staff_dtos::HandlerResponseDto>,
            ApiResponse<Vec<staff_dtos::HandlerResponseDto>>,
            // Roles
            roles_dtos::RoleResponseDto,
            roles_dtos::UpdateRolePermissionsDto,
            ApiResponse<Vec<roles_dtos::RoleResponseDto>>,
            ApiResponse<roles_dtos::RoleResponseDto>,
            // Categories
            categories_dtos::CategoryResponseDto,
            categories_dtos::CreateCategoryDto,
            categories_dtos::UpdateCategoryDto,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            // Reports
            reports_models::ReportStatus,
            reports_models::Severity,
            reports_models::OccurrencePeriod,
            reports_models::WasteType,
            reports_models::AssignmentStatus,
            Coordinates,
            reports_dtos::ReportResponseDto,
            reports_dtos::ReportDetailDto,
            reports_dtos::CreatedReportDto,
            reports_dtos::CreateReportDto,
            reports_dtos::UpdateReportDto,
            reports_dtos::ReportCategoryDto,
            reports_dtos::AssignCategoryDto,
            reports_dtos::ReportImageDto,
            reports_dtos::CommentResponseDto,
            reports_dtos::CreateCommentDto,
            reports_dtos::AssignmentResponseDto,
            reports_dtos::HandlerAssignmentDto,
            reports_dtos::ResolutionResponseDto,
            reports_dtos::CreateResolutionDto,
            reports_dtos::ResolveReportDto,
            reports_dtos::AcceptedReportDto,
            reports_dtos::ResolvedReportDto,
            reports_dtos::UpdateAssignmentProgressDto,
            ApiResponse<reports_dtos::ReportResponseDto>,
            ApiResponse<Vec<reports_dtos::ReportResponseDto>>,
            ApiResponse<reports_dtos::ReportDetailDto>,
            ApiResponse<reports_dtos::CreatedReportDto>,
            ApiResponse<reports_dtos::AcceptedReportDto>,
            ApiResponse<reports_dtos::ResolvedReportDto>,
            ApiResponse<Vec<reports_dtos::CommentResponseDto>>,
            ApiResponse<Vec<reports_dtos::HandlerAssignmentDto>>,
            // Rewards
            rewards_dtos::RewardResponseDto,
            rewards_dtos::UserRewardResponseDto,
            rewards_dtos::CreateRewardDto,
            rewards_dtos::UpdateRewardDto,
            rewards_dtos::GrantRewardDto,
            ApiResponse<Vec<rewards_dtos::RewardResponseDto>>,
            ApiResponse<Vec<rewards_dtos::UserRewardResponseDto>>,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login, confirmation and password reset"),
        (name = "users", description = "Citizen profiles and user administration"),
        (name = "staff", description = "Handler profiles and approval"),
        (name = "roles", description = "Role catalog and permissions (admin only)"),
        (name = "categories", description = "Waste categories"),
        (name = "reports", description = "Waste reports, categorization and photos"),
        (name = "comments", description = "Discussion under reports"),
        (name = "handling", description = "Verification, assignment and resolution of reports"),
        (name = "rewards", description = "Reward tiers and points"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Ripoti Taka API",
        version = "0.1.0",
        description = "Municipal waste reporting service",
    )
)]
pub struct ApiDoc;

/// Registers the session cookie as the API's security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_lifecycle_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/reports",
            "/api/reports/{id}/verify",
            "/api/reports/{id}/accept",
            "/api/reports/{id}/resolve",
            "/api/staff/assignments",
            "/api/auth/{kind}/login",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_document_lists_account_and_admin_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/{kind}/logout",
            "/api/auth/{kind}/confirm/{token}",
            "/api/auth/resend-confirmation",
            "/api/auth/{kind}/password-reset-request",
            "/api/auth/{kind}/password-reset/{token}",
            "/api/auth/password",
            "/api/auth/email",
            "/api/admin/users/{id}/active",
            "/api/admin/handlers/{id}/approval",
            "/api/admin/roles",
            "/api/admin/rewards/{id}/grant",
            "/api/admin/categories/{id}",
            "/api/reports/{id}/comments",
            "/api/reports/{id}/images",
            "/api/reports/{id}/assignments",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_session_cookie_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("session_cookie"));
    }

    #[test]
    fn test_info_modifier_overrides_title() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Custom".to_string(),
            version: "9.9.9".to_string(),
            description: "desc".to_string(),
        }
        .modify(&mut doc);
        assert_eq!(doc.info.title, "Custom");
        assert_eq!(doc.info.version, "9.9.9");
    }
}
