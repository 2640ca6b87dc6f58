//! Dashboard tab controller: which category is open, its cached rows, and
//! the per-row actions.

use std::collections::HashMap;

use super::client::{AdminClient, ApiError, Transport};
use super::dialog::Dialog;
use super::Route;
use crate::models::{
    Blog, CatalogItem, Category, Flag, LogEntry, PermissionMatrix, Query, User, ROOT_USER_ID,
};

/// One dashboard tab per permission category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Users,
    Products,
    Services,
    Blogs,
    Queries,
    Logs,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Users,
        Tab::Products,
        Tab::Services,
        Tab::Blogs,
        Tab::Queries,
        Tab::Logs,
    ];

    /// Path segment under `/api`.
    pub fn resource(self) -> &'static str {
        match self {
            Tab::Users => "users",
            Tab::Products => "products",
            Tab::Services => "services",
            Tab::Blogs => "blogs",
            Tab::Queries => "query",
            Tab::Logs => "logs",
        }
    }

    pub fn category(self) -> Category {
        match self {
            Tab::Users => Category::User,
            Tab::Products => Category::Product,
            Tab::Services => Category::Service,
            Tab::Blogs => Category::Blog,
            Tab::Queries => Category::Query,
            Tab::Logs => Category::Log,
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Tab::Users => "user",
            Tab::Products => "product",
            Tab::Services => "service",
            Tab::Blogs => "blog",
            Tab::Queries => "query",
            Tab::Logs => "log entry",
        }
    }

    /// Flag gating the tab's create form, if it has one.
    pub fn create_flag(self) -> Option<Flag> {
        match self {
            Tab::Users => Some(Flag::CreateUser),
            Tab::Products => Some(Flag::AddProduct),
            Tab::Services => Some(Flag::AddService),
            Tab::Blogs => Some(Flag::AddBlog),
            Tab::Queries | Tab::Logs => None,
        }
    }
}

/// Cached rows of one tab.
#[derive(Debug, Clone, PartialEq)]
pub enum TabRows {
    Users(Vec<User>),
    Products(Vec<CatalogItem>),
    Services(Vec<CatalogItem>),
    Blogs(Vec<Blog>),
    Queries(Vec<Query>),
    Logs(Vec<LogEntry>),
}

impl TabRows {
    pub fn tab(&self) -> Tab {
        match self {
            TabRows::Users(_) => Tab::Users,
            TabRows::Products(_) => Tab::Products,
            TabRows::Services(_) => Tab::Services,
            TabRows::Blogs(_) => Tab::Blogs,
            TabRows::Queries(_) => Tab::Queries,
            TabRows::Logs(_) => Tab::Logs,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TabRows::Users(rows) => rows.len(),
            TabRows::Products(rows) | TabRows::Services(rows) => rows.len(),
            TabRows::Blogs(rows) => rows.len(),
            TabRows::Queries(rows) => rows.len(),
            TabRows::Logs(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&mut self, id: &str) {
        let id = id.to_string();
        match self {
            TabRows::Users(rows) => rows.retain(|r| r.id.to_string() != id),
            TabRows::Products(rows) | TabRows::Services(rows) => {
                rows.retain(|r| r.id.to_string() != id)
            }
            TabRows::Blogs(rows) => rows.retain(|r| r.id.to_string() != id),
            TabRows::Queries(rows) => rows.retain(|r| r.id != id),
            TabRows::Logs(rows) => rows.retain(|r| r.id.to_string() != id),
        }
    }
}

/// Actions offered on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
    UpdatePassword,
    RetrievePassword,
    EditPermissions,
    UpdateStatus,
}

impl RowAction {
    /// Flag required for this action on `tab`, `None` if the tab has no such
    /// action.
    pub fn flag(self, tab: Tab) -> Option<Flag> {
        let flag = match (tab, self) {
            (Tab::Users, RowAction::Delete) => Flag::DeleteUser,
            (Tab::Users, RowAction::UpdatePassword) => Flag::UpdatePassword,
            (Tab::Users, RowAction::RetrievePassword) => Flag::RetrievePassword,
            (Tab::Users, RowAction::EditPermissions) => Flag::UpdatePermissions,
            (Tab::Products, RowAction::Edit) => Flag::UpdateProduct,
            (Tab::Products, RowAction::Delete) => Flag::DeleteProduct,
            (Tab::Services, RowAction::Edit) => Flag::UpdateService,
            (Tab::Services, RowAction::Delete) => Flag::DeleteService,
            (Tab::Blogs, RowAction::Edit) => Flag::UpdateBlog,
            (Tab::Blogs, RowAction::Delete) => Flag::DeleteBlog,
            (Tab::Queries, RowAction::UpdateStatus) => Flag::UpdateStatus,
            (Tab::Queries, RowAction::Delete) => Flag::DeleteQuery,
            (Tab::Logs, RowAction::Delete) => Flag::DeleteLog,
            _ => return None,
        };
        Some(flag)
    }
}

const ROW_ACTIONS: [RowAction; 6] = [
    RowAction::Edit,
    RowAction::UpdateStatus,
    RowAction::UpdatePassword,
    RowAction::RetrievePassword,
    RowAction::EditPermissions,
    RowAction::Delete,
];

/// Result of a row action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Done,
    /// The user dismissed the confirm or prompt.
    Cancelled,
    /// Rejected locally, no request was made.
    Refused(String),
    /// The server rejected the request; the message was alerted.
    Failed(String),
    Navigate(Route),
}

/// Token for one list fetch. Only the newest ticket may land its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub tab: Tab,
    generation: u64,
}

pub struct TabController {
    permissions: PermissionMatrix,
    active: Option<Tab>,
    loading: bool,
    generation: u64,
    rows: HashMap<Tab, TabRows>,
    error: Option<String>,
}

impl TabController {
    pub fn new(permissions: PermissionMatrix) -> Self {
        Self {
            permissions,
            active: None,
            loading: false,
            generation: 0,
            rows: HashMap::new(),
            error: None,
        }
    }

    /// Tabs the user may open. The rest are hidden.
    pub fn visible_tabs(&self) -> Vec<Tab> {
        Tab::ALL
            .into_iter()
            .filter(|tab| self.permissions.allows(tab.category().read_flag()))
            .collect()
    }

    pub fn active(&self) -> Option<Tab> {
        self.active
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn rows(&self, tab: Tab) -> Option<&TabRows> {
        self.rows.get(&tab)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn can_create(&self, tab: Tab) -> bool {
        tab.create_flag()
            .is_some_and(|flag| self.permissions.allows(flag))
    }

    /// Actions shown on row `id` of `tab`. The root admin's row never
    /// offers delete or permission edits.
    pub fn row_actions(&self, tab: Tab, id: &str) -> Vec<RowAction> {
        let root = is_root_row(tab, id);
        ROW_ACTIONS
            .into_iter()
            .filter(|action| {
                !(root && matches!(action, RowAction::Delete | RowAction::EditPermissions))
            })
            .filter(|action| {
                action
                    .flag(tab)
                    .is_some_and(|flag| self.permissions.allows(flag))
            })
            .collect()
    }

    /// Activate `tab`, or deactivate it if it is already open.
    ///
    /// Returns the ticket to fetch with, or `None` when nothing should be
    /// fetched. Any fetch still in flight is superseded either way.
    pub fn begin(&mut self, tab: Tab) -> Option<FetchTicket> {
        if !self.visible_tabs().contains(&tab) {
            return None;
        }

        self.generation += 1;
        self.error = None;

        if self.active == Some(tab) {
            self.active = None;
            self.loading = false;
            return None;
        }

        self.active = Some(tab);
        self.loading = true;
        Some(FetchTicket {
            tab,
            generation: self.generation,
        })
    }

    /// Land a fetch result. Returns `false` if the ticket was superseded and
    /// the result discarded.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<TabRows, ApiError>) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(tab = ?ticket.tab, "Discarding stale tab response");
            return false;
        }

        self.loading = false;
        match result {
            Ok(rows) => {
                self.rows.insert(ticket.tab, rows);
            }
            Err(e) => {
                tracing::warn!(tab = ?ticket.tab, "Failed to load tab: {}", e);
                self.error = Some(e.message);
            }
        }
        true
    }

    /// Click handler for a tab button.
    pub async fn toggle<T: Transport>(&mut self, client: &AdminClient<T>, tab: Tab) {
        if let Some(ticket) = self.begin(tab) {
            let result = client.list(tab).await;
            self.complete(ticket, result);
        }
    }

    /// Put a fresh copy of a user row into the cached list.
    pub fn replace_user(&mut self, user: User) {
        if let Some(TabRows::Users(rows)) = self.rows.get_mut(&Tab::Users) {
            if let Some(row) = rows.iter_mut().find(|r| r.id == user.id) {
                *row = user;
            }
        }
    }

    fn check(&self, tab: Tab, action: RowAction) -> Result<(), ActionOutcome> {
        match action.flag(tab) {
            Some(flag) if self.permissions.allows(flag) => Ok(()),
            Some(flag) => Err(ActionOutcome::Refused(format!(
                "Missing permission: {}",
                flag
            ))),
            None => Err(ActionOutcome::Refused(format!(
                "Action not available for {}",
                tab.resource()
            ))),
        }
    }

    pub async fn delete_row<T: Transport, D: Dialog>(
        &mut self,
        client: &AdminClient<T>,
        dialog: &D,
        tab: Tab,
        id: &str,
    ) -> ActionOutcome {
        if let Err(outcome) = self.check(tab, RowAction::Delete) {
            return outcome;
        }
        if tab == Tab::Users {
            match parse_user_id(id) {
                Some(ROOT_USER_ID) => {
                    return ActionOutcome::Refused("The root admin cannot be deleted".to_string())
                }
                Some(_) => {}
                None => return ActionOutcome::Refused(format!("Invalid user id '{}'", id)),
            }
        }
        if !dialog
            .confirm(&format!("Delete this {}?", tab.noun()))
            .await
        {
            return ActionOutcome::Cancelled;
        }

        match client.delete(tab, id).await {
            Ok(_) => {
                if let Some(rows) = self.rows.get_mut(&tab) {
                    rows.remove(id);
                }
                ActionOutcome::Done
            }
            Err(e) => fail(dialog, e).await,
        }
    }

    pub async fn update_password<T: Transport, D: Dialog>(
        &mut self,
        client: &AdminClient<T>,
        dialog: &D,
        user_id: i64,
    ) -> ActionOutcome {
        if let Err(outcome) = self.check(Tab::Users, RowAction::UpdatePassword) {
            return outcome;
        }
        let Some(password) = dialog.prompt("Enter the new password").await else {
            return ActionOutcome::Cancelled;
        };
        if password.is_empty() {
            return ActionOutcome::Cancelled;
        }

        match client.update_password(user_id, &password).await {
            Ok(message) => {
                dialog.alert(&message).await;
                ActionOutcome::Done
            }
            Err(e) => fail(dialog, e).await,
        }
    }

    pub async fn retrieve_password<T: Transport, D: Dialog>(
        &mut self,
        client: &AdminClient<T>,
        dialog: &D,
        user_id: i64,
    ) -> ActionOutcome {
        if let Err(outcome) = self.check(Tab::Users, RowAction::RetrievePassword) {
            return outcome;
        }
        if !dialog
            .confirm("Reset this user's password and email them a new one?")
            .await
        {
            return ActionOutcome::Cancelled;
        }

        match client.retrieve_password(user_id).await {
            Ok(message) => {
                dialog.alert(&message).await;
                ActionOutcome::Done
            }
            Err(e) => fail(dialog, e).await,
        }
    }

    pub async fn update_status<T: Transport, D: Dialog>(
        &mut self,
        client: &AdminClient<T>,
        dialog: &D,
        query_id: &str,
    ) -> ActionOutcome {
        if let Err(outcome) = self.check(Tab::Queries, RowAction::UpdateStatus) {
            return outcome;
        }
        let status = match dialog.prompt("Enter the new status").await {
            Some(status) if !status.trim().is_empty() => status.trim().to_string(),
            _ => return ActionOutcome::Cancelled,
        };

        match client.update_query_status(query_id, &status).await {
            Ok(updated) => {
                if let Some(TabRows::Queries(rows)) = self.rows.get_mut(&Tab::Queries) {
                    if let Some(row) = rows.iter_mut().find(|r| r.id == updated.id) {
                        *row = updated;
                    }
                }
                ActionOutcome::Done
            }
            Err(e) => fail(dialog, e).await,
        }
    }

    /// Open the permission editor for a user row.
    pub fn edit_permissions(&self, user_id: i64) -> ActionOutcome {
        if let Err(outcome) = self.check(Tab::Users, RowAction::EditPermissions) {
            return outcome;
        }
        if user_id == ROOT_USER_ID {
            return ActionOutcome::Refused(
                "The root admin's permissions cannot be edited".to_string(),
            );
        }
        ActionOutcome::Navigate(Route::EditPermissions(user_id))
    }
}

/// User row keys are numeric; `" 01"` and `"1"` are the same user.
fn parse_user_id(id: &str) -> Option<i64> {
    id.trim().parse().ok()
}

fn is_root_row(tab: Tab, id: &str) -> bool {
    tab == Tab::Users && parse_user_id(id) == Some(ROOT_USER_ID)
}

async fn fail<D: Dialog>(dialog: &D, error: ApiError) -> ActionOutcome {
    dialog.alert(&error.message).await;
    ActionOutcome::Failed(error.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::testing::{self, error, message, query_json, user_json, ScriptedDialog};
    use reqwest::Method;
    use serde_json::json;

    fn readers() -> PermissionMatrix {
        PermissionMatrix::from_flags(&[Flag::ReadUser, Flag::ReadProduct, Flag::ReadQuery]).unwrap()
    }

    #[test]
    fn test_unreadable_tabs_are_hidden() {
        let controller = TabController::new(readers());
        assert_eq!(
            controller.visible_tabs(),
            vec![Tab::Users, Tab::Products, Tab::Queries]
        );

        let mut controller = controller;
        assert_eq!(controller.begin(Tab::Logs), None);
        assert_eq!(controller.active(), None);
    }

    #[test]
    fn test_row_actions_follow_flags() {
        let permissions = PermissionMatrix::from_flags(&[
            Flag::ReadUser,
            Flag::DeleteUser,
            Flag::ReadProduct,
            Flag::UpdateProduct,
        ])
        .unwrap();
        let controller = TabController::new(permissions);

        assert_eq!(controller.row_actions(Tab::Users, "2"), vec![RowAction::Delete]);
        assert!(controller.row_actions(Tab::Users, "1").is_empty());
        assert_eq!(controller.row_actions(Tab::Products, "p1"), vec![RowAction::Edit]);
        assert!(controller.row_actions(Tab::Logs, "7").is_empty());
        assert!(!controller.can_create(Tab::Users));

        let full = TabController::new(PermissionMatrix::full());
        assert_eq!(
            full.row_actions(Tab::Users, "2"),
            vec![
                RowAction::UpdatePassword,
                RowAction::RetrievePassword,
                RowAction::EditPermissions,
                RowAction::Delete,
            ]
        );
        assert_eq!(
            full.row_actions(Tab::Users, "01"),
            vec![RowAction::UpdatePassword, RowAction::RetrievePassword]
        );
        assert!(full.can_create(Tab::Blogs));
        assert!(!full.can_create(Tab::Queries));
    }

    #[tokio::test]
    async fn test_toggling_active_tab_closes_it_without_fetch() {
        let client = testing::client();
        client
            .transport()
            .reply(Method::GET, "users/getAll", Ok(json!([user_json(2, "ravi", &readers())])));
        let mut controller = TabController::new(readers());

        controller.toggle(&client, Tab::Users).await;
        assert_eq!(controller.active(), Some(Tab::Users));
        assert!(!controller.is_loading());
        assert_eq!(controller.rows(Tab::Users).map(TabRows::len), Some(1));

        controller.toggle(&client, Tab::Users).await;
        assert_eq!(controller.active(), None);
        assert_eq!(client.transport().count("users/getAll"), 1);
    }

    #[test]
    fn test_last_request_wins() {
        let mut controller = TabController::new(readers());

        let first = controller.begin(Tab::Users).unwrap();
        let second = controller.begin(Tab::Products).unwrap();

        assert!(controller.complete(second, Ok(TabRows::Products(Vec::new()))));
        assert!(!controller.complete(first, Ok(TabRows::Users(Vec::new()))));

        assert_eq!(controller.active(), Some(Tab::Products));
        assert!(controller.rows(Tab::Users).is_none());
        assert!(!controller.is_loading());
    }

    #[test]
    fn test_closing_tab_discards_inflight_fetch() {
        let mut controller = TabController::new(readers());
        let ticket = controller.begin(Tab::Users).unwrap();
        assert!(controller.is_loading());

        assert!(controller.begin(Tab::Users).is_none());
        assert!(!controller.is_loading());
        assert!(!controller.complete(ticket, Ok(TabRows::Users(Vec::new()))));
        assert!(controller.rows(Tab::Users).is_none());
    }

    #[test]
    fn test_failed_fetch_clears_loading() {
        let mut controller = TabController::new(readers());
        let ticket = controller.begin(Tab::Queries).unwrap();

        assert!(controller.complete(ticket, Err(ApiError::status(500, "boom"))));
        assert!(!controller.is_loading());
        assert_eq!(controller.error(), Some("boom"));
    }

    #[tokio::test]
    async fn test_root_user_guarded_before_network() {
        let client = testing::client();
        let dialog = ScriptedDialog::new(true, None);
        let mut controller = TabController::new(PermissionMatrix::full());

        for root in ["1", "01", " 1", "+1"] {
            let outcome = controller.delete_row(&client, &dialog, Tab::Users, root).await;
            assert!(matches!(outcome, ActionOutcome::Refused(_)), "{root:?} not refused");
        }
        let outcome = controller.delete_row(&client, &dialog, Tab::Users, "abc").await;
        assert!(matches!(outcome, ActionOutcome::Refused(_)));
        assert!(matches!(controller.edit_permissions(1), ActionOutcome::Refused(_)));
        assert_eq!(
            controller.edit_permissions(2),
            ActionOutcome::Navigate(Route::EditPermissions(2))
        );
        assert!(client.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_flag_refused_before_network() {
        let client = testing::client();
        let dialog = ScriptedDialog::new(true, Some("newpassword"));
        let mut controller = TabController::new(readers());

        let outcome = controller.update_password(&client, &dialog, 2).await;
        assert_eq!(
            outcome,
            ActionOutcome::Refused("Missing permission: updatePassword".to_string())
        );
        assert!(client.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_patches_cached_rows() {
        let client = testing::client();
        let full = PermissionMatrix::full();
        client
            .transport()
            .reply(
                Method::GET,
                "users/getAll",
                Ok(json!([user_json(2, "ravi", &full), user_json(3, "meera", &full)])),
            )
            .reply(Method::DELETE, "users/delete/3", message("User meera deleted"));
        let mut controller = TabController::new(full);
        controller.toggle(&client, Tab::Users).await;

        let cancel = ScriptedDialog::new(false, None);
        let outcome = controller.delete_row(&client, &cancel, Tab::Users, "3").await;
        assert_eq!(outcome, ActionOutcome::Cancelled);
        assert_eq!(client.transport().count("users/delete/3"), 0);

        let confirm = ScriptedDialog::new(true, None);
        let outcome = controller.delete_row(&client, &confirm, Tab::Users, "3").await;
        assert_eq!(outcome, ActionOutcome::Done);

        let Some(TabRows::Users(rows)) = controller.rows(Tab::Users) else {
            panic!("users not cached");
        };
        assert_eq!(rows.iter().map(|u| u.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(client.transport().count("users/getAll"), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_alerted_verbatim() {
        let client = testing::client();
        client.transport().reply(
            Method::DELETE,
            "logs/delete/4",
            error(403, "Missing permission: deleteLog"),
        );
        let dialog = ScriptedDialog::new(true, None);
        let mut controller = TabController::new(PermissionMatrix::full());

        let outcome = controller.delete_row(&client, &dialog, Tab::Logs, "4").await;
        assert_eq!(
            outcome,
            ActionOutcome::Failed("Missing permission: deleteLog".to_string())
        );
        assert_eq!(dialog.alerts(), vec!["Missing permission: deleteLog".to_string()]);
    }

    #[tokio::test]
    async fn test_status_update_replaces_row() {
        let client = testing::client();
        client
            .transport()
            .reply(Method::GET, "query/getAll", Ok(json!([query_json("q1", "pending")])))
            .reply(Method::PUT, "query/updateStatus/q1", Ok(query_json("q1", "approved")));
        let dialog = ScriptedDialog::new(true, Some(" approved "));
        let mut controller = TabController::new(PermissionMatrix::full());
        controller.toggle(&client, Tab::Queries).await;

        let outcome = controller.update_status(&client, &dialog, "q1").await;
        assert_eq!(outcome, ActionOutcome::Done);

        let calls = client.transport().calls();
        assert_eq!(calls[1].2, Some(json!({ "status": "approved" })));
        let Some(TabRows::Queries(rows)) = controller.rows(Tab::Queries) else {
            panic!("queries not cached");
        };
        assert_eq!(rows[0].status, "approved");
    }

    #[tokio::test]
    async fn test_empty_prompt_cancels() {
        let client = testing::client();
        let dialog = ScriptedDialog::new(true, Some(""));
        let mut controller = TabController::new(PermissionMatrix::full());

        assert_eq!(
            controller.update_password(&client, &dialog, 2).await,
            ActionOutcome::Cancelled
        );
        assert!(client.transport().calls().is_empty());
    }
}
