//! Session-based authentication module.
//!
//! Passwords are stored as bcrypt hashes. A successful login opens a
//! server-side session whose random token travels in an `HttpOnly` cookie; the
//! session layer resolves it to the current user (with fresh permissions) on
//! every admin request.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rand::{distributions::Alphanumeric, Rng};
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::models::{Flag, User};
use crate::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session_id";

/// Length of generated temporary passwords.
const TEMP_PASSWORD_LEN: usize = 12;

/// The authenticated admin behind the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Fail with `403` unless the user holds `flag`.
    pub fn require(&self, flag: Flag) -> Result<(), AppError> {
        if self.0.permissions.allows(flag) {
            Ok(())
        } else {
            tracing::debug!(user = %self.0.username, %flag, "Permission denied");
            Err(AppError::Forbidden(format!("Missing permission: {}", flag)))
        }
    }

    pub fn username(&self) -> &str {
        &self.0.username
    }
}

/// Session layer for admin routes: resolves the cookie or answers `401`.
pub async fn session_auth_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match resolve_session(&state, request.headers()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return AppError::Unauthorized("Not authenticated".to_string()).into_response()
        }
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}

/// Resolve the session cookie carried by `headers`, if any.
pub async fn resolve_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<User>, AppError> {
    match session_token(headers) {
        Some(token) => state.repo.session_user(&token).await,
        None => Ok(None),
    }
}

/// Extract the session token from the `Cookie` header(s).
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value opening a session.
pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value removing the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", Duration::ZERO, secure)
}

/// Hash a password on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// Check a password against a stored bcrypt hash on the blocking pool.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(matches)
}

/// Random alphanumeric password handed out by password retrieval.
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TEMP_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Perform constant-time string comparison.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    // Constant-time comparison
    a_bytes.ct_eq(b_bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use crate::models::PermissionMatrix;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("482913", "482913"));
        assert!(!constant_time_compare("482913", "482914"));
        assert!(!constant_time_compare("short", "much-longer-key"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_id=abc123; lang=en"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));

        let mut cleared = HeaderMap::new();
        cleared.insert(header::COOKIE, HeaderValue::from_static("session_id="));
        assert_eq!(session_token(&cleared), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", Duration::from_secs(3600), true);
        assert!(cookie.starts_with("session_id=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));

        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }

    #[test]
    fn test_require_checks_flag() {
        let user = CurrentUser(User {
            id: 7,
            username: "reader".into(),
            email: "reader@example.com".into(),
            permissions: PermissionMatrix::from_flags(&[Flag::ReadUser]).unwrap(),
            created_at: String::new(),
        });
        assert!(user.require(Flag::ReadUser).is_ok());
        let err = user.require(Flag::DeleteUser).unwrap_err();
        assert_eq!(err.message(), "Missing permission: deleteUser");
    }

    #[tokio::test]
    async fn test_password_hash_round_trip() {
        let hash = hash_password("hunter22", 4).await.unwrap();
        assert!(verify_password("hunter22", &hash).await.unwrap());
        assert!(!verify_password("hunter23", &hash).await.unwrap());
    }

    #[test]
    fn test_generated_password_shape() {
        let password = generate_password();
        assert_eq!(password.len(), TEMP_PASSWORD_LEN);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
