//! Audit log API endpoints.

use axum::{extract::State, Extension, Json};

use super::{ApiPath, ApiResult};
use crate::auth::CurrentUser;
use crate::models::{Flag, LogEntry, MessageResponse};
use crate::AppState;

/// GET /api/logs/getAll - List the audit trail.
pub async fn list_logs(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<LogEntry>> {
    user.require(Flag::ReadLog)?;
    Ok(Json(state.repo.list_logs().await?))
}

/// DELETE /api/logs/delete/:id - Remove one audit entry. Not itself audited.
pub async fn delete_log(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<MessageResponse> {
    user.require(Flag::DeleteLog)?;

    state.repo.delete_log(id).await?;
    tracing::info!(user = %user.username(), id, "Audit entry deleted");

    Ok(Json(MessageResponse::new(format!("Log {} deleted", id))))
}
