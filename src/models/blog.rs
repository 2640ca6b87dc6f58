//! Blog post model.

use serde::{Deserialize, Serialize};

/// A blog post. `body_content` is raw HTML written by trusted admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub image: String,
    pub body_content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogRequest {
    pub title: String,
    #[serde(default)]
    pub image: String,
    pub body_content: String,
}

/// Request body for updating a blog post. Absent fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_content: Option<String>,
}
