use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use axum_extra::extract::cookie::SignedCookieJar;

use crate::core::error::Result;
use crate::core::extractor::CurrentSession;
use crate::features::auth::clients::{
    generate_state, validate_callback, OAuthCallbackQuery, OAuthProvider,
};
use crate::features::auth::principal::PrincipalKind;
use crate::features::auth::services::AuthService;

/// Start an OAuth2 login: remember a random state and redirect to the provider
#[utoipa::path(
    get,
    path = "/api/auth/oauth2/{provider}/authorize",
    params(("provider" = String, Path, description = "google or github")),
    responses(
        (status = 303, description = "Redirect to the provider's consent page"),
        (status = 404, description = "Provider unknown or not configured")
    ),
    tag = "auth"
)]
pub async fn authorize(
    State(service): State<Arc<AuthService>>,
    Path(provider): Path<String>,
    CurrentSession(session): CurrentSession,
) -> Result<(SignedCookieJar, Redirect)> {
    let provider = OAuthProvider::from_name(&provider)?;

    let state = generate_state();
    let url = service.oauth().authorize_url(provider, &state)?;
    let jar = service.sessions().with_oauth_state(session, &state);

    Ok((jar, Redirect::to(&url)))
}

/// Provider callback: check state, exchange the code and sign the citizen in
#[utoipa::path(
    get,
    path = "/api/auth/oauth2/{provider}/callback",
    params(
        ("provider" = String, Path, description = "google or github"),
        OAuthCallbackQuery
    ),
    responses(
        (status = 303, description = "Logged in, redirect to the citizen dashboard"),
        (status = 401, description = "Authorization failed"),
        (status = 404, description = "Provider unknown or not configured")
    ),
    tag = "auth"
)]
pub async fn callback(
    State(service): State<Arc<AuthService>>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
    CurrentSession(session): CurrentSession,
) -> Result<(SignedCookieJar, Redirect)> {
    let provider = OAuthProvider::from_name(&provider)?;

    let expected_state = session.as_ref().and_then(|s| s.oauth2_state.as_deref());
    let code = validate_callback(&query, expected_state)?;

    let email = service.oauth().fetch_email(provider, &code).await?;
    let user = service.oauth_login(provider, &email).await?;

    let jar = service
        .sessions()
        .login(PrincipalKind::User, user.id, false);
    Ok((jar, Redirect::to(PrincipalKind::User.dashboard_path())))
}
