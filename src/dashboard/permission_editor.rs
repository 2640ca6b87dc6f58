//! Per-user permission editor.

use super::client::{AdminClient, Transport};
use super::Route;
use crate::models::{Flag, PermissionMatrix, User, ROOT_USER_ID};

/// Outcome banner shown after a submit or a create form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Success(String),
    Failure(String),
}

/// Why the editor could not be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    /// Leave the editor for another view.
    Redirect { to: Route, message: String },
    /// The user could not be loaded.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct PermissionEditor {
    user_id: i64,
    username: String,
    matrix: PermissionMatrix,
    error: Option<String>,
    banner: Option<Banner>,
}

impl PermissionEditor {
    /// Load `user_id` and open the editor on its current matrix.
    pub async fn open<T: Transport>(client: &AdminClient<T>, user_id: i64) -> Result<Self, OpenError> {
        refuse_root(user_id)?;
        let user = client
            .get_user(user_id)
            .await
            .map_err(|e| OpenError::Failed(e.message))?;
        Self::for_user(user)
    }

    /// Open the editor on a user row that is already loaded.
    pub fn for_user(user: User) -> Result<Self, OpenError> {
        refuse_root(user.id)?;
        Ok(Self {
            user_id: user.id,
            username: user.username,
            matrix: user.permissions,
            error: None,
            banner: None,
        })
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn matrix(&self) -> &PermissionMatrix {
        &self.matrix
    }

    /// Inline error from the last rejected checkbox change.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// Apply one checkbox change. Returns `false` if it was rejected.
    pub fn toggle(&mut self, flag: Flag, checked: bool) -> bool {
        match self.matrix.set(flag, checked) {
            Ok(()) => {
                self.error = None;
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }

    /// Save the edited matrix.
    pub async fn submit<T: Transport>(&mut self, client: &AdminClient<T>) -> bool {
        match client.update_permissions(self.user_id, &self.matrix).await {
            Ok(user) => {
                self.matrix = user.permissions;
                self.banner = Some(Banner::Success(format!(
                    "Permissions updated for {}",
                    self.username
                )));
                true
            }
            Err(e) => {
                self.banner = Some(Banner::Failure(e.message));
                false
            }
        }
    }
}

fn refuse_root(user_id: i64) -> Result<(), OpenError> {
    if user_id == ROOT_USER_ID {
        return Err(OpenError::Redirect {
            to: Route::Dashboard,
            message: "The root admin's permissions cannot be edited".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::testing::{self, error, user_json};
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_root_redirects_before_network() {
        let client = testing::client();

        let result = PermissionEditor::open(&client, ROOT_USER_ID).await;
        assert!(matches!(
            result,
            Err(OpenError::Redirect { to: Route::Dashboard, .. })
        ));
        assert!(client.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_enforces_read_first() {
        let client = testing::client();
        client.transport().reply(
            Method::GET,
            "users/getById/2",
            Ok(user_json(2, "ravi", &PermissionMatrix::empty())),
        );
        let mut editor = PermissionEditor::open(&client, 2).await.unwrap();
        assert_eq!(editor.username(), "ravi");

        assert!(!editor.toggle(Flag::AddBlog, true));
        assert!(editor.error().is_some());
        assert!(!editor.matrix().allows(Flag::AddBlog));

        assert!(editor.toggle(Flag::ReadBlog, true));
        assert!(editor.error().is_none());
        assert!(editor.toggle(Flag::AddBlog, true));
        assert!(editor.toggle(Flag::DeleteBlog, true));

        assert!(editor.toggle(Flag::ReadBlog, false));
        assert!(!editor.matrix().allows(Flag::AddBlog));
        assert!(!editor.matrix().allows(Flag::DeleteBlog));
    }

    #[tokio::test]
    async fn test_submit_sends_matrix_and_banners() {
        let granted = PermissionMatrix::from_flags(&[Flag::ReadLog, Flag::DeleteLog]).unwrap();
        let client = testing::client();
        client
            .transport()
            .reply(
                Method::PUT,
                "users/updateUserPermissions/2",
                Ok(user_json(2, "ravi", &granted)),
            )
            .reply(
                Method::PUT,
                "users/updateUserPermissions/2",
                error(403, "Missing permission: updatePermissions"),
            );
        let mut editor =
            PermissionEditor::for_user(testing::user(2, "ravi", PermissionMatrix::empty())).unwrap();
        editor.toggle(Flag::ReadLog, true);
        editor.toggle(Flag::DeleteLog, true);

        assert!(editor.submit(&client).await);
        assert!(matches!(editor.banner(), Some(Banner::Success(_))));
        let body = client.transport().calls()[0].2.clone().unwrap();
        assert_eq!(body["permissions"]["log"]["deleteLog"], json!(true));

        assert!(!editor.submit(&client).await);
        assert_eq!(
            editor.banner(),
            Some(&Banner::Failure("Missing permission: updatePermissions".to_string()))
        );
    }
}
