//! Session gate in front of every admin view.

use std::time::Duration;

use super::client::{AdminClient, ApiError, Transport};
use super::Route;
use crate::models::User;

/// How long the gate's message stays up before redirecting.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Authorized(User),
    /// No session; the login view may be shown.
    ShowLogin,
    Redirect {
        to: Route,
        message: String,
        delay: Duration,
    },
}

impl GateOutcome {
    fn redirect(to: Route, message: impl Into<String>) -> Self {
        GateOutcome::Redirect {
            to,
            message: message.into(),
            delay: REDIRECT_DELAY,
        }
    }
}

/// Caches the session snapshot until explicitly invalidated.
#[derive(Debug, Default)]
pub struct SessionGate {
    snapshot: Option<User>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&User> {
        self.snapshot.as_ref()
    }

    /// Drop the cached snapshot so the next check asks the server again.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    /// Seed the snapshot with the user returned by a login.
    pub fn authenticated(&mut self, user: User) {
        self.snapshot = Some(user);
    }

    /// Decide whether `route` may be shown.
    pub async fn check<T: Transport>(&mut self, client: &AdminClient<T>, route: Route) -> GateOutcome {
        if route == Route::Login {
            return match self.load(client).await {
                Ok(Some(_)) => GateOutcome::redirect(Route::Dashboard, "Already logged in"),
                _ => GateOutcome::ShowLogin,
            };
        }

        let user = match self.load(client).await {
            Ok(Some(user)) => user,
            Ok(None) => return GateOutcome::redirect(Route::Login, "Please log in to continue"),
            Err(e) => {
                tracing::warn!("Session check failed: {}", e);
                return GateOutcome::redirect(Route::Login, e.message);
            }
        };

        match route.required_flag() {
            Some(flag) if !user.permissions.allows(flag) => GateOutcome::redirect(
                Route::Dashboard,
                format!("You do not have permission to view this page ({})", flag),
            ),
            _ => GateOutcome::Authorized(user),
        }
    }

    /// End the session server side and forget the snapshot.
    pub async fn logout<T: Transport>(&mut self, client: &AdminClient<T>) -> Result<(), ApiError> {
        self.invalidate();
        client.logout().await
    }

    async fn load<T: Transport>(&mut self, client: &AdminClient<T>) -> Result<Option<User>, ApiError> {
        if let Some(user) = &self.snapshot {
            return Ok(Some(user.clone()));
        }

        let session = client.session().await?;
        self.snapshot = match session.user {
            Some(user) if session.authenticated => Some(user),
            _ => None,
        };
        Ok(self.snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::testing::{self, error, message, user_json};
    use crate::models::{Flag, PermissionMatrix};
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_no_session_redirects_to_login() {
        let client = testing::client();
        client
            .transport()
            .reply(Method::GET, "users/session", Ok(json!({ "authenticated": false })));
        let mut gate = SessionGate::new();

        let GateOutcome::Redirect { to, delay, .. } = gate.check(&client, Route::Dashboard).await
        else {
            panic!("expected a redirect");
        };
        assert_eq!(to, Route::Login);
        assert_eq!(delay, REDIRECT_DELAY);
        assert!(gate.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_session_error_redirects_with_message() {
        let client = testing::client();
        client
            .transport()
            .reply(Method::GET, "users/session", error(500, "Database error"));
        let mut gate = SessionGate::new();

        assert_eq!(
            gate.check(&client, Route::Dashboard).await,
            GateOutcome::Redirect {
                to: Route::Login,
                message: "Database error".to_string(),
                delay: REDIRECT_DELAY,
            }
        );
    }

    #[tokio::test]
    async fn test_missing_flag_redirects_to_dashboard() {
        let permissions = PermissionMatrix::from_flags(&[Flag::ReadUser]).unwrap();
        let client = testing::client();
        client.transport().reply(
            Method::GET,
            "users/session",
            Ok(json!({ "authenticated": true, "user": user_json(2, "ravi", &permissions) })),
        );
        let mut gate = SessionGate::new();

        assert!(matches!(
            gate.check(&client, Route::Dashboard).await,
            GateOutcome::Authorized(_)
        ));
        assert!(matches!(
            gate.check(&client, Route::EditPermissions(3)).await,
            GateOutcome::Redirect { to: Route::Dashboard, .. }
        ));
        // Snapshot is reused until invalidated.
        assert_eq!(client.transport().count("users/session"), 1);
    }

    #[tokio::test]
    async fn test_logout_invalidates_snapshot() {
        let full = PermissionMatrix::full();
        let client = testing::client();
        client
            .transport()
            .reply(
                Method::GET,
                "users/session",
                Ok(json!({ "authenticated": true, "user": user_json(1, "root", &full) })),
            )
            .reply(Method::POST, "users/logout", message("Logged out"))
            .reply(Method::GET, "users/session", Ok(json!({ "authenticated": false })));
        let mut gate = SessionGate::new();

        assert!(matches!(
            gate.check(&client, Route::CreateUser).await,
            GateOutcome::Authorized(_)
        ));
        gate.logout(&client).await.unwrap();
        assert!(gate.snapshot().is_none());
        assert_eq!(gate.check(&client, Route::Login).await, GateOutcome::ShowLogin);
        assert_eq!(client.transport().count("users/session"), 2);
    }
}
