//! Cookie-backed sessions.
//!
//! The session lives in a single signed cookie holding a small JSON document.
//! Signing uses a key derived from `SECRET_KEY`, so a client can read but not
//! forge it. The cookie is persistent only when the principal asked to be
//! remembered; the embedded expiry bounds its lifetime either way.

use std::time::Duration;

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use uuid::Uuid;

use crate::features::auth::principal::PrincipalKind;

pub const SESSION_COOKIE: &str = "ripoti_session";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Which principal table `principal_id` refers to
    pub user_type: Option<PrincipalKind>,
    pub principal_id: Option<Uuid>,
    /// Anti-CSRF state of an OAuth2 flow in progress
    pub oauth2_state: Option<String>,
    /// Unix seconds after which the session is ignored
    pub expires_at: i64,
}

impl SessionData {
    pub fn principal(&self) -> Option<(PrincipalKind, Uuid)> {
        match (self.user_type, self.principal_id) {
            (Some(kind), Some(id)) => Some((kind, id)),
            _ => None,
        }
    }

    fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

pub struct SessionManager {
    key: Key,
    lifetime: Duration,
    secure: bool,
}

impl SessionManager {
    pub fn new(secret: &str, lifetime: Duration, secure: bool) -> Self {
        // Key requires 64 bytes of material
        let digest = Sha512::digest(secret.as_bytes());
        Self {
            key: Key::from(digest.as_slice()),
            lifetime,
            secure,
        }
    }

    /// Read and validate the session from request headers
    pub fn read(&self, headers: &HeaderMap) -> Option<SessionData> {
        let jar = SignedCookieJar::from_headers(headers, self.key.clone());
        let cookie = jar.get(SESSION_COOKIE)?;

        let decoded = URL_SAFE_NO_PAD.decode(cookie.value()).ok()?;
        let data: SessionData = match serde_json::from_slice(&decoded) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!("Ignoring unreadable session cookie: {}", e);
                return None;
            }
        };

        if data.is_expired(Utc::now().timestamp()) {
            tracing::debug!("Ignoring expired session");
            return None;
        }

        Some(data)
    }

    /// Start an authenticated session
    pub fn login(&self, kind: PrincipalKind, id: Uuid, remember: bool) -> SignedCookieJar {
        let data = SessionData {
            user_type: Some(kind),
            principal_id: Some(id),
            oauth2_state: None,
            expires_at: self.expiry(),
        };
        self.write(&data, remember)
    }

    /// Keep the current session (if any) and attach an OAuth2 state value
    pub fn with_oauth_state(&self, current: Option<SessionData>, state: &str) -> SignedCookieJar {
        let mut data = current.unwrap_or_default();
        data.oauth2_state = Some(state.to_string());
        data.expires_at = self.expiry();
        self.write(&data, false)
    }

    pub fn logout(&self) -> SignedCookieJar {
        SignedCookieJar::new(self.key.clone()).remove(Cookie::build(SESSION_COOKIE).path("/"))
    }

    fn expiry(&self) -> i64 {
        Utc::now().timestamp() + self.lifetime.as_secs() as i64
    }

    fn write(&self, data: &SessionData, remember: bool) -> SignedCookieJar {
        // SessionData only holds plain fields, serialization cannot fail
        let json = serde_json::to_vec(data).unwrap_or_default();
        let value = URL_SAFE_NO_PAD.encode(json);

        let mut cookie = Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax);

        if remember {
            let max_age = time::Duration::seconds(self.lifetime.as_secs() as i64);
            cookie = cookie.max_age(max_age);
        }

        SignedCookieJar::new(self.key.clone()).add(cookie.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{COOKIE, SET_COOKIE};
    use axum::response::IntoResponse;

    const SECRET: &str = "session-secret-key-with-at-least-32-bytes";

    fn manager() -> SessionManager {
        SessionManager::new(SECRET, Duration::from_secs(3600), false)
    }

    /// Turn the Set-Cookie header a jar produces into a request Cookie header
    fn request_headers(jar: SignedCookieJar) -> HeaderMap {
        let response = jar.into_response();
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        let pair = set_cookie.split(';').next().unwrap().to_string();

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, pair.parse().unwrap());
        headers
    }

    fn set_cookie_header(jar: SignedCookieJar) -> String {
        jar.into_response()
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_login_session_round_trip() {
        let id = Uuid::new_v4();
        let headers = request_headers(manager().login(PrincipalKind::Handler, id, false));

        let data = manager().read(&headers).unwrap();
        assert_eq!(data.principal(), Some((PrincipalKind::Handler, id)));
    }

    #[test]
    fn test_cookie_signed_with_other_key_is_ignored() {
        let other = SessionManager::new(
            "a-completely-different-secret-key-0123456789",
            Duration::from_secs(3600),
            false,
        );
        let headers = request_headers(other.login(PrincipalKind::User, Uuid::new_v4(), false));

        assert!(manager().read(&headers).is_none());
    }

    #[test]
    fn test_expired_session_is_ignored() {
        let expired = SessionManager::new(SECRET, Duration::from_secs(0), false);
        let headers = request_headers(expired.login(PrincipalKind::User, Uuid::new_v4(), false));

        assert!(manager().read(&headers).is_none());
    }

    #[test]
    fn test_remember_me_sets_max_age() {
        let persistent = set_cookie_header(manager().login(PrincipalKind::User, Uuid::new_v4(), true));
        assert!(persistent.contains("Max-Age=3600"));
        assert!(persistent.contains("HttpOnly"));

        let transient = set_cookie_header(manager().login(PrincipalKind::User, Uuid::new_v4(), false));
        assert!(!transient.contains("Max-Age"));
    }

    #[test]
    fn test_oauth_state_keeps_existing_principal() {
        let id = Uuid::new_v4();
        let current = SessionData {
            user_type: Some(PrincipalKind::User),
            principal_id: Some(id),
            oauth2_state: None,
            expires_at: Utc::now().timestamp() + 60,
        };
        let headers = request_headers(manager().with_oauth_state(Some(current), "abc"));

        let data = manager().read(&headers).unwrap();
        assert_eq!(data.oauth2_state.as_deref(), Some("abc"));
        assert_eq!(data.principal(), Some((PrincipalKind::User, id)));
    }
}
