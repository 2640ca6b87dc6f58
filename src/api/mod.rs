//! REST API module.
//!
//! Contains all API routes and handlers following the dashboard contract:
//! successes are the bare domain object, failures the `{ "error": ... }`
//! envelope from [`crate::errors`].

mod blogs;
mod logs;
mod products;
mod public;
mod queries;
mod users;
mod verification;

pub use blogs::*;
pub use logs::*;
pub use products::*;
pub use public::*;
pub use queries::*;
pub use users::*;
pub use verification::*;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::request::Parts,
    Json,
};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::AppState;

/// Response type for every handler.
pub type ApiResult<T> = Result<Json<T>, AppError>;

/// JSON body extractor whose rejections use the error envelope.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(Self(value))
    }
}

/// Path extractor whose rejections use the error envelope.
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(Self(value))
    }
}

/// Append an audit entry for a completed admin change.
///
/// The change itself already happened, so a failed write is logged rather
/// than reported to the caller.
pub(crate) async fn record(state: &AppState, user: &CurrentUser, change: String) {
    if let Err(e) = state.repo.append_log(user.username(), &change).await {
        tracing::warn!("Failed to write audit entry '{}': {}", change, e);
    }
}
