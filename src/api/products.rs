//! Product and service API endpoints.
//!
//! Both catalogs share one implementation parameterised by [`CatalogKind`].

use axum::{extract::State, Extension, Json};

use super::{record, ApiJson, ApiPath, ApiResult};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{
    CatalogItem, CatalogKind, CreateCatalogItemRequest, Flag, MessageResponse,
    UpdateCatalogItemRequest,
};
use crate::validation::{self, FieldClass, FieldError};
use crate::AppState;

/// Flags guarding (read, create, update, delete) for a catalog.
fn flags(kind: CatalogKind) -> (Flag, Flag, Flag, Flag) {
    match kind {
        CatalogKind::Product => (
            Flag::ReadProduct,
            Flag::AddProduct,
            Flag::UpdateProduct,
            Flag::DeleteProduct,
        ),
        CatalogKind::Service => (
            Flag::ReadService,
            Flag::AddService,
            Flag::UpdateService,
            Flag::DeleteService,
        ),
    }
}

async fn list(state: AppState, user: CurrentUser, kind: CatalogKind) -> ApiResult<Vec<CatalogItem>> {
    user.require(flags(kind).0)?;
    Ok(Json(state.repo.list_items(kind).await?))
}

async fn get(state: AppState, user: CurrentUser, kind: CatalogKind, id: i64) -> ApiResult<CatalogItem> {
    user.require(flags(kind).0)?;

    state
        .repo
        .get_item(kind, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("{} {} not found", kind.label(), id)))
}

async fn create(
    state: AppState,
    user: CurrentUser,
    kind: CatalogKind,
    request: CreateCatalogItemRequest,
) -> ApiResult<CatalogItem> {
    user.require(flags(kind).1)?;
    validation::require("title", &request.title, FieldClass::ShortText)?;
    validation::require("description", &request.description, FieldClass::LongText)?;
    validation::limit("mainImage", &request.main_image, FieldClass::ShortText)?;

    let item = state.repo.create_item(kind, &request).await?;

    record(
        &state,
        &user,
        format!("Created {} {} ({})", kind.category(), item.id, item.title),
    )
    .await;
    Ok(Json(item))
}

async fn update(
    state: AppState,
    user: CurrentUser,
    kind: CatalogKind,
    id: i64,
    request: UpdateCatalogItemRequest,
) -> ApiResult<CatalogItem> {
    user.require(flags(kind).2)?;
    check_update(&request)?;

    let item = state.repo.update_item(kind, id, &request).await?;

    record(
        &state,
        &user,
        format!("Updated {} {} ({})", kind.category(), item.id, item.title),
    )
    .await;
    Ok(Json(item))
}

async fn delete(
    state: AppState,
    user: CurrentUser,
    kind: CatalogKind,
    id: i64,
) -> ApiResult<MessageResponse> {
    user.require(flags(kind).3)?;

    state.repo.delete_item(kind, id).await?;

    record(&state, &user, format!("Deleted {} {}", kind.category(), id)).await;
    Ok(Json(MessageResponse::new(format!(
        "{} {} deleted",
        kind.label(),
        id
    ))))
}

fn check_update(request: &UpdateCatalogItemRequest) -> Result<(), FieldError> {
    if let Some(title) = &request.title {
        validation::require("title", title, FieldClass::ShortText)?;
    }
    if let Some(description) = &request.description {
        validation::require("description", description, FieldClass::LongText)?;
    }
    if let Some(main_image) = &request.main_image {
        validation::limit("mainImage", main_image, FieldClass::ShortText)?;
    }
    Ok(())
}

/// GET /api/products/getAll
pub async fn list_products(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<CatalogItem>> {
    list(state, user, CatalogKind::Product).await
}

/// GET /api/products/getById/:id
pub async fn get_product(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<CatalogItem> {
    get(state, user, CatalogKind::Product, id).await
}

/// POST /api/products/create
pub async fn create_product(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(request): ApiJson<CreateCatalogItemRequest>,
) -> ApiResult<CatalogItem> {
    create(state, user, CatalogKind::Product, request).await
}

/// PUT /api/products/update/:id
pub async fn update_product(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateCatalogItemRequest>,
) -> ApiResult<CatalogItem> {
    update(state, user, CatalogKind::Product, id, request).await
}

/// DELETE /api/products/delete/:id
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<MessageResponse> {
    delete(state, user, CatalogKind::Product, id).await
}

/// GET /api/services/getAll
pub async fn list_services(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<CatalogItem>> {
    list(state, user, CatalogKind::Service).await
}

/// GET /api/services/getById/:id
pub async fn get_service(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<CatalogItem> {
    get(state, user, CatalogKind::Service, id).await
}

/// POST /api/services/create
pub async fn create_service(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(request): ApiJson<CreateCatalogItemRequest>,
) -> ApiResult<CatalogItem> {
    create(state, user, CatalogKind::Service, request).await
}

/// PUT /api/services/update/:id
pub async fn update_service(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateCatalogItemRequest>,
) -> ApiResult<CatalogItem> {
    update(state, user, CatalogKind::Service, id, request).await
}

/// DELETE /api/services/delete/:id
pub async fn delete_service(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<MessageResponse> {
    delete(state, user, CatalogKind::Service, id).await
}
