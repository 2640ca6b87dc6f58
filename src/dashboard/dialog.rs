//! Blocking user prompts raised by row actions.

use async_trait::async_trait;

/// The confirm/prompt/alert surface of whatever front end hosts the
/// dashboard.
#[async_trait]
pub trait Dialog: Send + Sync {
    /// Ask a yes/no question.
    async fn confirm(&self, message: &str) -> bool;

    /// Ask for a line of text. `None` means the user cancelled.
    async fn prompt(&self, message: &str) -> Option<String>;

    /// Show a message.
    async fn alert(&self, message: &str);
}
