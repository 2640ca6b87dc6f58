//! Blog API endpoints.

use axum::{extract::State, Extension, Json};

use super::{record, ApiJson, ApiPath, ApiResult};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{Blog, CreateBlogRequest, Flag, MessageResponse, UpdateBlogRequest};
use crate::validation::{self, FieldClass};
use crate::AppState;

/// GET /api/blogs/getAll - List all blog posts.
pub async fn list_blogs(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<Blog>> {
    user.require(Flag::ReadBlog)?;
    Ok(Json(state.repo.list_blogs().await?))
}

/// GET /api/blogs/getById/:id - Get a single blog post.
pub async fn get_blog(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Blog> {
    user.require(Flag::ReadBlog)?;

    state
        .repo
        .get_blog(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Blog {} not found", id)))
}

/// POST /api/blogs/create - Create a blog post.
pub async fn create_blog(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(request): ApiJson<CreateBlogRequest>,
) -> ApiResult<Blog> {
    user.require(Flag::AddBlog)?;
    validation::require("title", &request.title, FieldClass::ShortText)?;
    validation::limit("image", &request.image, FieldClass::ShortText)?;
    if request.body_content.trim().is_empty() {
        return Err(AppError::Validation("bodyContent: is required".to_string()));
    }

    let blog = state.repo.create_blog(&request).await?;

    record(&state, &user, format!("Created blog {} ({})", blog.id, blog.title)).await;
    Ok(Json(blog))
}

/// PUT /api/blogs/update/:id - Update a blog post.
pub async fn update_blog(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateBlogRequest>,
) -> ApiResult<Blog> {
    user.require(Flag::UpdateBlog)?;
    if let Some(title) = &request.title {
        validation::require("title", title, FieldClass::ShortText)?;
    }
    if let Some(image) = &request.image {
        validation::limit("image", image, FieldClass::ShortText)?;
    }

    let blog = state.repo.update_blog(id, &request).await?;

    record(&state, &user, format!("Updated blog {} ({})", blog.id, blog.title)).await;
    Ok(Json(blog))
}

/// DELETE /api/blogs/delete/:id - Delete a blog post.
pub async fn delete_blog(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<MessageResponse> {
    user.require(Flag::DeleteBlog)?;

    state.repo.delete_blog(id).await?;

    record(&state, &user, format!("Deleted blog {}", id)).await;
    Ok(Json(MessageResponse::new(format!("Blog {} deleted", id))))
}
