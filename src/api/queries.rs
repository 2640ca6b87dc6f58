//! Customer query API endpoints.
//!
//! Submission is public; everything else is admin-only.

use axum::{extract::State, Extension, Json};

use super::{record, ApiJson, ApiPath, ApiResult};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{
    Flag, MessageResponse, Query, QueryType, SubmitQueryRequest, UpdateStatusRequest,
};
use crate::validation::{self, FieldClass};
use crate::AppState;

/// GET /api/query/getAll - List all queries.
pub async fn list_queries(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<Query>> {
    user.require(Flag::ReadQuery)?;
    Ok(Json(state.repo.list_queries().await?))
}

/// GET /api/query/getById/:id - Get a single query.
pub async fn get_query(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Query> {
    user.require(Flag::ReadQuery)?;

    state
        .repo
        .get_query(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Query {} not found", id)))
}

/// PUT /api/query/updateStatus/:id - Move a query to another workflow status.
pub async fn update_query_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> ApiResult<Query> {
    user.require(Flag::UpdateStatus)?;
    let status = request.status.trim();
    validation::require("status", status, FieldClass::Status)?;

    let query = state.repo.update_query_status(&id, status).await?;

    record(
        &state,
        &user,
        format!("Set status of query {} to {}", id, status),
    )
    .await;
    Ok(Json(query))
}

/// DELETE /api/query/delete/:id - Delete a query.
pub async fn delete_query(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<MessageResponse> {
    user.require(Flag::DeleteQuery)?;

    state.repo.delete_query(&id).await?;

    record(&state, &user, format!("Deleted query {}", id)).await;
    Ok(Json(MessageResponse::new(format!("Query {} deleted", id))))
}

/// POST /api/query/products/:form - Submit a product contact form.
pub async fn submit_product_query(
    State(state): State<AppState>,
    ApiPath(form): ApiPath<String>,
    ApiJson(request): ApiJson<SubmitQueryRequest>,
) -> ApiResult<Query> {
    submit(state, "products", &form, request).await
}

/// POST /api/query/services/:form - Submit a service contact form.
pub async fn submit_service_query(
    State(state): State<AppState>,
    ApiPath(form): ApiPath<String>,
    ApiJson(request): ApiJson<SubmitQueryRequest>,
) -> ApiResult<Query> {
    submit(state, "services", &form, request).await
}

async fn submit(
    state: AppState,
    group: &str,
    form: &str,
    request: SubmitQueryRequest,
) -> ApiResult<Query> {
    let query_type = QueryType::from_route(group, form)
        .ok_or_else(|| AppError::NotFound(format!("Unknown form {}/{}", group, form)))?;

    validation::contact(&request.name, &request.email, &request.phone)?;
    let payload = serde_json::to_string(&request.data)?;
    validation::limit("data", &payload, FieldClass::LongText)?;

    // Taken only once the payload is known to be acceptable.
    if query_type.requires_verification() && !state.verifier.take_grant(&request.email).await {
        return Err(AppError::Forbidden(
            "Email address has not been verified".to_string(),
        ));
    }

    let query = state.repo.create_query(query_type, &request).await?;
    tracing::info!(id = %query.id, querytype = %query_type.as_str(), "Query submitted");

    Ok(Json(query))
}
