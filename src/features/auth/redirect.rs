use axum::http::Uri;

use crate::core::error::AppError;
use crate::features::auth::principal::PrincipalKind;

/// Accept `next` only when it is a same-origin relative path, else use `fallback`
pub fn safe_next(next: Option<&str>, fallback: &str) -> String {
    match next.map(str::trim) {
        Some(path) if is_local_path(path) => path.to_string(),
        _ => fallback.to_string(),
    }
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.contains("://")
        && !path.chars().any(char::is_control)
}

/// Redirect an anonymous request to the login endpoint for `kind`, keeping the target as `next`
pub fn login_required(kind: PrincipalKind, target: &Uri) -> AppError {
    let next = target
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    AppError::LoginRequired(format!(
        "{}?next={}",
        kind.login_path(),
        urlencoding::encode(next)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: &str = "/api/reports/mine";

    #[test]
    fn test_relative_paths_are_kept() {
        assert_eq!(safe_next(Some("/api/reports/42"), FALLBACK), "/api/reports/42");
        assert_eq!(
            safe_next(Some("/api/reports?page=2"), FALLBACK),
            "/api/reports?page=2"
        );
    }

    #[test]
    fn test_external_targets_fall_back() {
        assert_eq!(safe_next(Some("https://evil.example"), FALLBACK), FALLBACK);
        assert_eq!(safe_next(Some("//evil.example/path"), FALLBACK), FALLBACK);
        assert_eq!(safe_next(Some("/\\evil.example"), FALLBACK), FALLBACK);
        assert_eq!(safe_next(Some("api/reports"), FALLBACK), FALLBACK);
        assert_eq!(safe_next(Some("/redirect?to=http://evil"), FALLBACK), FALLBACK);
        assert_eq!(safe_next(Some(""), FALLBACK), FALLBACK);
        assert_eq!(safe_next(None, FALLBACK), FALLBACK);
    }

    #[test]
    fn test_login_required_preserves_target() {
        let uri: Uri = "/api/reports/abc/comments?page=2".parse().unwrap();
        match login_required(PrincipalKind::User, &uri) {
            AppError::LoginRequired(location) => assert_eq!(
                location,
                "/api/auth/user/login?next=%2Fapi%2Freports%2Fabc%2Fcomments%3Fpage%3D2"
            ),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
