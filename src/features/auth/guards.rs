//! Principal-based authorization guards.
//!
//! Each guard reads the principal the session layer stored in the request
//! extensions. Anonymous requests are redirected to the login endpoint of
//! the principal kind the route expects; authenticated principals of the
//! wrong kind or without the permission get `403`.
//!
//! - `RequireAuthenticated`: any logged-in principal
//! - `RequireUser`: any citizen
//! - `RequireMember`: citizen holding MEMBER (confirmed reporter)
//! - `RequireHandler`: any staff member
//! - `RequireModerator`: any principal holding MODERATE
//! - `RequireAdmin`: any principal holding ADMIN

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{request::Parts, Uri},
};

use crate::core::error::AppError;
use crate::features::auth::principal::{CurrentHandler, CurrentUser, Principal, PrincipalKind};
use crate::features::auth::redirect::login_required;
use crate::features::roles::models::Permission;

fn principal(parts: &Parts) -> Principal {
    parts
        .extensions
        .get::<Principal>()
        .cloned()
        .unwrap_or(Principal::Anonymous)
}

/// Full request URI, including any prefix stripped by nested routers
fn target(parts: &Parts) -> Uri {
    parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| original.0.clone())
        .unwrap_or_else(|| parts.uri.clone())
}

/// Guard for citizen-only routes.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireUser(user): RequireUser) { ... }
/// ```
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match principal(parts) {
            Principal::User(user) => Ok(RequireUser(user)),
            Principal::Handler(_) => Err(AppError::Forbidden(
                "This action is only available to citizen accounts".to_string(),
            )),
            Principal::Anonymous => Err(login_required(PrincipalKind::User, &target(parts))),
        }
    }
}

/// Guard for citizens allowed to submit content (MEMBER permission).
pub struct RequireMember(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireMember
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;

        if !Principal::User(user.clone()).can(Permission::MEMBER) {
            return Err(AppError::Forbidden(
                "Please confirm your account to continue".to_string(),
            ));
        }

        Ok(RequireMember(user))
    }
}

/// Guard for staff-only routes.
pub struct RequireHandler(pub CurrentHandler);

impl<S> FromRequestParts<S> for RequireHandler
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match principal(parts) {
            Principal::Handler(handler) => Ok(RequireHandler(handler)),
            Principal::User(_) => Err(AppError::Forbidden(
                "This action is only available to handler accounts".to_string(),
            )),
            Principal::Anonymous => Err(login_required(PrincipalKind::Handler, &target(parts))),
        }
    }
}

/// Guard for report moderation (MODERATE permission, any principal kind).
pub struct RequireModerator(pub Principal);

impl<S> FromRequestParts<S> for RequireModerator
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = principal(parts);

        if !principal.is_authenticated() {
            return Err(login_required(PrincipalKind::Handler, &target(parts)));
        }
        if !principal.can(Permission::MODERATE) {
            return Err(AppError::Forbidden("Moderator access required".to_string()));
        }

        Ok(RequireModerator(principal))
    }
}

/// Guard for administration routes (ADMIN permission, any principal kind).
pub struct RequireAdmin(pub Principal);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = principal(parts);

        if !principal.is_authenticated() {
            return Err(login_required(PrincipalKind::User, &target(parts)));
        }
        if !principal.is_administrator() {
            return Err(AppError::Forbidden(
                "Administrator access required".to_string(),
            ));
        }

        Ok(RequireAdmin(principal))
    }
}

/// Guard for routes open to any logged-in principal.
///
/// Anonymous callers are sent to the citizen login.
pub struct RequireAuthenticated(pub Principal);

impl<S> FromRequestParts<S> for RequireAuthenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = principal(parts);

        if !principal.is_authenticated() {
            return Err(login_required(PrincipalKind::User, &target(parts)));
        }

        Ok(RequireAuthenticated(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::roles::models::RoleGrant;
    use axum::http::Request;
    use uuid::Uuid;

    fn parts_with(principal: Option<Principal>) -> Parts {
        let (mut parts, _) = Request::builder()
            .uri("/api/reports/new?x=1")
            .body(())
            .unwrap()
            .into_parts();
        if let Some(p) = principal {
            parts.extensions.insert(p);
        }
        parts
    }

    fn user(bits: i64) -> Principal {
        Principal::User(CurrentUser {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            username: "alice".to_string(),
            confirmed: bits > 1,
            role: Some(RoleGrant {
                title: "Test".to_string(),
                permissions: Permission::from_bits(bits),
            }),
        })
    }

    fn handler() -> Principal {
        Principal::Handler(CurrentHandler {
            id: Uuid::new_v4(),
            email: "h@x.com".to_string(),
            name: "Crew".to_string(),
            confirmed: true,
            approved: true,
            role: Some(RoleGrant {
                title: "Handler".to_string(),
                permissions: Permission::from_bits(7),
            }),
        })
    }

    #[tokio::test]
    async fn test_anonymous_user_route_redirects_to_user_login() {
        let mut parts = parts_with(None);
        let err = RequireUser::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        match err {
            AppError::LoginRequired(location) => {
                assert!(location.starts_with("/api/auth/user/login?next="));
                assert!(location.ends_with("%2Fapi%2Freports%2Fnew%3Fx%3D1"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_anonymous_handler_route_redirects_to_handler_login() {
        let mut parts = parts_with(Some(Principal::Anonymous));
        let err = RequireHandler::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(
            matches!(err, AppError::LoginRequired(ref l) if l.starts_with("/api/auth/handler/login"))
        );
    }

    #[tokio::test]
    async fn test_wrong_kind_is_forbidden() {
        let mut parts = parts_with(Some(handler()));
        assert!(matches!(
            RequireUser::from_request_parts(&mut parts, &()).await,
            Err(AppError::Forbidden(_))
        ));

        let mut parts = parts_with(Some(user(3)));
        assert!(matches!(
            RequireHandler::from_request_parts(&mut parts, &()).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_member_requires_member_permission() {
        let mut guest = parts_with(Some(user(1)));
        assert!(matches!(
            RequireMember::from_request_parts(&mut guest, &()).await,
            Err(AppError::Forbidden(_))
        ));

        let mut reporter = parts_with(Some(user(3)));
        assert!(RequireMember::from_request_parts(&mut reporter, &())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_moderator_and_admin() {
        let mut staff = parts_with(Some(handler()));
        assert!(RequireModerator::from_request_parts(&mut staff, &())
            .await
            .is_ok());
        assert!(matches!(
            RequireAdmin::from_request_parts(&mut staff, &()).await,
            Err(AppError::Forbidden(_))
        ));

        let mut admin = parts_with(Some(user(15)));
        assert!(RequireAdmin::from_request_parts(&mut admin, &())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_authenticated_accepts_either_kind() {
        let mut anonymous = parts_with(None);
        assert!(matches!(
            RequireAuthenticated::from_request_parts(&mut anonymous, &()).await,
            Err(AppError::LoginRequired(_))
        ));

        let mut staff = parts_with(Some(handler()));
        assert!(RequireAuthenticated::from_request_parts(&mut staff, &())
            .await
            .is_ok());

        let mut citizen = parts_with(Some(user(1)));
        assert!(RequireAuthenticated::from_request_parts(&mut citizen, &())
            .await
            .is_ok());
    }
}
