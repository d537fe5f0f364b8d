use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::SignedCookieJar;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, CurrentSession};
use crate::features::auth::dtos::{
    ChangeEmailDto, ChangePasswordDto, LoginDto, LoginFormDto, LoginFormQuery, LoginResponseDto,
    MeResponseDto, PasswordResetDto, PasswordResetRequestDto, RegisterHandlerDto,
    RegisterUserDto,
};
use crate::features::auth::principal::{Principal, PrincipalKind};
use crate::features::auth::redirect::{login_required, safe_next};
use crate::features::auth::services::{AuthService, ConfirmationOutcome};
use crate::features::staff::dtos::HandlerResponseDto;
use crate::features::users::dtos::UserResponseDto;
use crate::shared::types::ApiResponse;

/// Register a citizen account
#[utoipa::path(
    post,
    path = "/api/auth/register/user",
    request_body = RegisterUserDto,
    responses(
        (status = 201, description = "Registration successful", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error, e.g. email already registered")
    ),
    tag = "auth"
)]
pub async fn register_user(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<RegisterUserDto>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponseDto>>)> {
    dto.validate()?;

    let user = service.register_user(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(user.into()),
            Some("Registration successful. Feel free to login.".to_string()),
            None,
        )),
    ))
}

/// Register a handler (municipal staff) account
#[utoipa::path(
    post,
    path = "/api/auth/register/handler",
    request_body = RegisterHandlerDto,
    responses(
        (status = 201, description = "Registration successful", body = ApiResponse<HandlerResponseDto>),
        (status = 400, description = "Validation error, e.g. email already registered")
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<RegisterHandlerDto>,
) -> Result<(StatusCode, Json<ApiResponse<HandlerResponseDto>>)> {
    dto.validate()?;

    let handler = service.register_handler(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(handler.into()),
            Some("Registration successful. Feel free to login.".to_string()),
            None,
        )),
    ))
}

/// Describe the login endpoint; principals already signed in are sent to their dashboard
#[utoipa::path(
    get,
    path = "/api/auth/{kind}/login",
    params(
        ("kind" = PrincipalKind, Path, description = "user or handler"),
        ("next" = Option<String>, Query, description = "Relative path to continue to")
    ),
    responses(
        (status = 200, description = "Login form", body = ApiResponse<LoginFormDto>),
        (status = 303, description = "Already logged in")
    ),
    tag = "auth"
)]
pub async fn login_form(
    State(service): State<Arc<AuthService>>,
    Path(kind): Path<PrincipalKind>,
    Query(query): Query<LoginFormQuery>,
    principal: Principal,
) -> Response {
    if principal.kind() == Some(kind) {
        return Redirect::to(kind.dashboard_path()).into_response();
    }

    let form = LoginFormDto {
        kind,
        next: query.next.map(|next| safe_next(Some(&next), kind.dashboard_path())),
        oauth_providers: match kind {
            PrincipalKind::User => service.oauth().configured(),
            PrincipalKind::Handler => Vec::new(),
        },
    };

    Json(ApiResponse::success(Some(form), None, None)).into_response()
}

/// Log in with e-mail and password
#[utoipa::path(
    post,
    path = "/api/auth/{kind}/login",
    params(("kind" = PrincipalKind, Path, description = "user or handler")),
    request_body = LoginDto,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = ApiResponse<LoginResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    Path(kind): Path<PrincipalKind>,
    AppJson(dto): AppJson<LoginDto>,
) -> Result<(SignedCookieJar, Json<ApiResponse<LoginResponseDto>>)> {
    dto.validate()?;

    let id = service.login(kind, &dto).await?;
    let jar = service.sessions().login(kind, id, dto.remember_me);

    let response = LoginResponseDto {
        kind,
        id,
        redirect_to: safe_next(dto.next.as_deref(), kind.dashboard_path()),
    };

    Ok((
        jar,
        Json(ApiResponse::success(
            Some(response),
            Some("Welcome back!".to_string()),
            None,
        )),
    ))
}

/// Log out the current principal of the given kind
#[utoipa::path(
    post,
    path = "/api/auth/{kind}/logout",
    params(("kind" = PrincipalKind, Path, description = "user or handler")),
    responses(
        (status = 200, description = "Logged out, session cookie cleared"),
        (status = 303, description = "Not logged in"),
        (status = 403, description = "Logged in as the other principal kind")
    ),
    tag = "auth"
)]
pub async fn logout(
    State(service): State<Arc<AuthService>>,
    Path(kind): Path<PrincipalKind>,
    OriginalUri(uri): OriginalUri,
    principal: Principal,
) -> Result<(SignedCookieJar, Json<ApiResponse<()>>)> {
    match principal.kind() {
        Some(current) if current == kind => {}
        Some(_) => {
            return Err(AppError::Forbidden(format!(
                "You are not logged in as a {}",
                kind
            )))
        }
        None => return Err(login_required(kind, &uri)),
    }

    tracing::info!("{} {:?} logged out", kind, principal.id());
    Ok((
        service.sessions().logout(),
        Json(ApiResponse::<()>::message(
            "You have been logged out successfully.",
        )),
    ))
}

/// Confirm an account from the link sent by e-mail
#[utoipa::path(
    get,
    path = "/api/auth/{kind}/confirm/{token}",
    params(
        ("kind" = PrincipalKind, Path, description = "user or handler"),
        ("token" = String, Path, description = "Confirmation token")
    ),
    responses(
        (status = 200, description = "Account confirmed"),
        (status = 401, description = "Invalid or expired link")
    ),
    tag = "auth"
)]
pub async fn confirm(
    State(service): State<Arc<AuthService>>,
    Path((kind, token)): Path<(PrincipalKind, String)>,
) -> Result<Json<ApiResponse<()>>> {
    let message = match service.confirm(kind, &token).await? {
        ConfirmationOutcome::Confirmed => "You have confirmed your account. Thanks!",
        ConfirmationOutcome::AlreadyConfirmed => "Your account is already confirmed.",
    };
    Ok(Json(ApiResponse::<()>::message(message)))
}

/// Send a new confirmation link to the logged-in principal
#[utoipa::path(
    post,
    path = "/api/auth/resend-confirmation",
    responses(
        (status = 200, description = "Confirmation e-mail queued"),
        (status = 303, description = "Not logged in"),
        (status = 409, description = "Already confirmed")
    ),
    tag = "auth",
    security(("session_cookie" = []))
)]
pub async fn resend_confirmation(
    State(service): State<Arc<AuthService>>,
    OriginalUri(uri): OriginalUri,
    principal: Principal,
) -> Result<Json<ApiResponse<()>>> {
    if !principal.is_authenticated() {
        return Err(login_required(PrincipalKind::User, &uri));
    }

    service.resend_confirmation(&principal).await?;
    Ok(Json(ApiResponse::<()>::message(
        "A new confirmation email has been sent to you via email.",
    )))
}

/// Request a password reset link
#[utoipa::path(
    post,
    path = "/api/auth/{kind}/password-reset-request",
    params(("kind" = PrincipalKind, Path, description = "user or handler")),
    request_body = PasswordResetRequestDto,
    responses(
        (status = 200, description = "Request accepted"),
        (status = 400, description = "Validation error")
    ),
    tag = "auth"
)]
pub async fn request_password_reset(
    State(service): State<Arc<AuthService>>,
    Path(kind): Path<PrincipalKind>,
    AppJson(dto): AppJson<PasswordResetRequestDto>,
) -> Result<Json<ApiResponse<()>>> {
    dto.validate()?;

    service.request_password_reset(kind, &dto.email).await?;
    Ok(Json(ApiResponse::<()>::message(
        "If an account exists for that address, a password reset email has been sent.",
    )))
}

/// Set a new password using a reset link
#[utoipa::path(
    post,
    path = "/api/auth/{kind}/password-reset/{token}",
    params(
        ("kind" = PrincipalKind, Path, description = "user or handler"),
        ("token" = String, Path, description = "Password reset token")
    ),
    request_body = PasswordResetDto,
    responses(
        (status = 200, description = "Password updated"),
        (status = 303, description = "Already logged in"),
        (status = 401, description = "Invalid or expired link")
    ),
    tag = "auth"
)]
pub async fn reset_password(
    State(service): State<Arc<AuthService>>,
    Path((kind, token)): Path<(PrincipalKind, String)>,
    principal: Principal,
    AppJson(dto): AppJson<PasswordResetDto>,
) -> Result<Response> {
    if let Some(current) = principal.kind() {
        return Ok(Redirect::to(current.dashboard_path()).into_response());
    }

    dto.validate()?;
    service.reset_password(kind, &token, &dto).await?;

    Ok(Json(ApiResponse::<()>::message("Password updated successfully")).into_response())
}

/// Current principal and its capabilities
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current principal (anonymous included)", body = ApiResponse<MeResponseDto>)
    ),
    tag = "auth",
    security(("session_cookie" = []))
)]
pub async fn me(principal: Principal) -> Json<ApiResponse<MeResponseDto>> {
    Json(ApiResponse::success(
        Some(MeResponseDto::from(&principal)),
        None,
        None,
    ))
}

/// Change the password of the logged-in principal
#[utoipa::path(
    put,
    path = "/api/auth/password",
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed"),
        (status = 303, description = "Not logged in"),
        (status = 400, description = "Validation error or wrong current password")
    ),
    tag = "auth",
    security(("session_cookie" = []))
)]
pub async fn change_password(
    State(service): State<Arc<AuthService>>,
    OriginalUri(uri): OriginalUri,
    principal: Principal,
    AppJson(dto): AppJson<ChangePasswordDto>,
) -> Result<Json<ApiResponse<()>>> {
    if !principal.is_authenticated() {
        return Err(login_required(PrincipalKind::User, &uri));
    }
    dto.validate()?;

    service.change_password(&principal, &dto).await?;
    Ok(Json(ApiResponse::<()>::message(
        "Your password has been updated.",
    )))
}

/// Change the e-mail address of the logged-in principal
#[utoipa::path(
    put,
    path = "/api/auth/email",
    request_body = ChangeEmailDto,
    responses(
        (status = 200, description = "Address changed, confirmation e-mail queued"),
        (status = 303, description = "Not logged in"),
        (status = 400, description = "Validation error, wrong password or address taken")
    ),
    tag = "auth",
    security(("session_cookie" = []))
)]
pub async fn change_email(
    State(service): State<Arc<AuthService>>,
    OriginalUri(uri): OriginalUri,
    principal: Principal,
    AppJson(dto): AppJson<ChangeEmailDto>,
) -> Result<Json<ApiResponse<()>>> {
    if !principal.is_authenticated() {
        return Err(login_required(PrincipalKind::User, &uri));
    }
    dto.validate()?;

    service.change_email(&principal, &dto).await?;
    Ok(Json(ApiResponse::<()>::message(
        "Your email address has been updated. Please confirm the new address.",
    )))
}

/// Drop a stale session and send the client back to the matching login endpoint
#[utoipa::path(
    get,
    path = "/api/auth/reauthenticate",
    responses((status = 303, description = "Session cleared, redirect to login")),
    tag = "auth"
)]
pub async fn reauthenticate(
    State(service): State<Arc<AuthService>>,
    CurrentSession(session): CurrentSession,
) -> (SignedCookieJar, Redirect) {
    let kind = session
        .and_then(|data| data.user_type)
        .unwrap_or(PrincipalKind::User);

    (
        service.sessions().logout(),
        Redirect::to(kind.login_path()),
    )
}
