//! User, login and session API endpoints.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Extension, Json,
};

use super::{record, ApiJson, ApiPath, ApiResult};
use crate::auth::{self, CurrentUser};
use crate::errors::AppError;
use crate::models::{
    CreateUserRequest, Flag, LoginRequest, LoginResponse, MessageResponse, SessionResponse,
    UpdatePasswordRequest, UpdatePermissionsRequest, User, ROOT_USER_ID,
};
use crate::validation::{self, FieldClass};
use crate::AppState;

/// GET /api/users/session - Report whether the caller holds a live session.
pub async fn get_session(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<SessionResponse> {
    let user = auth::resolve_session(&state, &headers).await?;

    Ok(Json(SessionResponse {
        authenticated: user.is_some(),
        user,
    }))
}

/// POST /api/users/verify - Log in with username or email and password.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Response, AppError> {
    let identifier = request.identifier.trim();
    if identifier.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Identifier and password are required".to_string(),
        ));
    }

    let Some((user, hash)) = state.repo.find_credentials(identifier).await? else {
        tracing::info!(%identifier, "Login failed: unknown identifier");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    if !auth::verify_password(&request.password, &hash).await? {
        tracing::info!(user = %user.username, "Login failed: wrong password");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state
        .repo
        .create_session(user.id, state.config.session_ttl)
        .await?;
    let cookie = auth::session_cookie(&token, state.config.session_ttl, state.config.cookie_secure);
    tracing::info!(user = %user.username, "Login succeeded");

    Ok(([(header::SET_COOKIE, cookie)], Json(LoginResponse { user })).into_response())
}

/// POST /api/users/logout - End the caller's session.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    if let Some(token) = auth::session_token(&headers) {
        state.repo.delete_session(&token).await?;
    }

    let cookie = auth::clear_session_cookie(state.config.cookie_secure);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse::new("Logged out")),
    )
        .into_response())
}

/// GET /api/users/getAll - List all users.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<User>> {
    user.require(Flag::ReadUser)?;
    Ok(Json(state.repo.list_users().await?))
}

/// GET /api/users/getById/:id - Get a single user.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<User> {
    user.require(Flag::ReadUser)?;

    state
        .repo
        .get_user(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
}

/// POST /api/users/create - Create a new user.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> ApiResult<User> {
    user.require(Flag::CreateUser)?;

    let username = request.username.trim();
    let email = request.email.trim();
    validation::require("username", username, FieldClass::Name)?;
    validation::email("email", email)?;
    validation::password("password", &request.password)?;
    request.permissions.validate()?;

    let hash = auth::hash_password(&request.password, state.config.bcrypt_cost).await?;
    let created = state
        .repo
        .create_user(username, email, &hash, &request.permissions)
        .await?;

    record(&state, &user, format!("Created user {}", created.username)).await;
    Ok(Json(created))
}

/// DELETE /api/users/delete/:id - Delete a user.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<MessageResponse> {
    user.require(Flag::DeleteUser)?;
    if id == ROOT_USER_ID {
        return Err(AppError::Forbidden(
            "The root admin cannot be deleted".to_string(),
        ));
    }

    let target = find_user(&state, id).await?;
    state.repo.delete_user(id).await?;

    record(&state, &user, format!("Deleted user {}", target.username)).await;
    Ok(Json(MessageResponse::new(format!(
        "User {} deleted",
        target.username
    ))))
}

/// PUT /api/users/updatePassword/:id - Set a new password for a user.
pub async fn update_password(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdatePasswordRequest>,
) -> ApiResult<MessageResponse> {
    user.require(Flag::UpdatePassword)?;
    guard_root_password(&user, id)?;
    validation::password("password", &request.password)?;

    let target = find_user(&state, id).await?;
    let hash = auth::hash_password(&request.password, state.config.bcrypt_cost).await?;
    state.repo.update_password(id, &hash).await?;
    if id != user.0.id {
        state.repo.delete_user_sessions(id).await?;
    }

    record(
        &state,
        &user,
        format!("Updated password of {}", target.username),
    )
    .await;
    Ok(Json(MessageResponse::new("Password updated")))
}

/// POST /api/users/retrievePassword/:id - Reset to a temporary password and
/// mail it to the user.
pub async fn retrieve_password(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<MessageResponse> {
    user.require(Flag::RetrievePassword)?;
    guard_root_password(&user, id)?;

    let target = find_user(&state, id).await?;
    let temporary = auth::generate_password();
    let hash = auth::hash_password(&temporary, state.config.bcrypt_cost).await?;
    state.repo.update_password(id, &hash).await?;
    if id != user.0.id {
        state.repo.delete_user_sessions(id).await?;
    }

    state
        .verifier
        .mailer()
        .send(
            &target.email,
            "Your temporary password",
            &format!(
                "Hello {}, your temporary dashboard password is {}. Please change it after logging in.",
                target.username, temporary
            ),
        )
        .await?;

    record(
        &state,
        &user,
        format!("Issued temporary password for {}", target.username),
    )
    .await;
    Ok(Json(MessageResponse::new(format!(
        "Temporary password sent to {}",
        target.email
    ))))
}

/// PUT /api/users/updateUserPermissions/:id - Replace a user's permission matrix.
pub async fn update_user_permissions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdatePermissionsRequest>,
) -> ApiResult<User> {
    user.require(Flag::UpdatePermissions)?;
    if id == ROOT_USER_ID {
        return Err(AppError::Forbidden(
            "The root admin's permissions cannot be changed".to_string(),
        ));
    }
    request.permissions.validate()?;

    let updated = state
        .repo
        .update_permissions(id, &request.permissions)
        .await?;

    record(
        &state,
        &user,
        format!("Updated permissions of {}", updated.username),
    )
    .await;
    Ok(Json(updated))
}

async fn find_user(state: &AppState, id: i64) -> Result<User, AppError> {
    state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
}

/// Only the root admin may change the root admin's password.
fn guard_root_password(user: &CurrentUser, id: i64) -> Result<(), AppError> {
    if id == ROOT_USER_ID && user.0.id != ROOT_USER_ID {
        return Err(AppError::Forbidden(
            "Only the root admin can change its password".to_string(),
        ));
    }
    Ok(())
}
