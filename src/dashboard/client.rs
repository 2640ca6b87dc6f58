//! Typed access to the admin REST API.
//!
//! [`Transport`] is the single network seam: it moves one JSON request and
//! hands back either the JSON body or an [`ApiError`] carrying the server's
//! `error` message verbatim. [`AdminClient`] layers the endpoint table on top.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::tabs::{Tab, TabRows};
use crate::models::{
    Blog, CatalogItem, CatalogKind, CreateBlogRequest, CreateCatalogItemRequest,
    CreateUserRequest, LoginRequest, LoginResponse, MessageResponse, PermissionMatrix, Query,
    QueryType, SendOtpRequest, SessionResponse, SubmitQueryRequest, UpdateBlogRequest,
    UpdateCatalogItemRequest, UpdatePasswordRequest, UpdatePermissionsRequest,
    UpdateStatusRequest, User, VerificationResponse, VerifyCaptchaRequest, VerifyOtpRequest,
};

/// Request timeout for dashboard calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Failure of one API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status, `None` when the request never got a response.
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

/// Moves one JSON request to the API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `path` is relative to `/api`, e.g. `users/getAll`.
    async fn send(&self, method: Method, path: &str, body: Option<Value>)
        -> Result<Value, ApiError>;
}

/// [`Transport`] over HTTP with a cookie jar holding the session cookie.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}/api/{}", self.base_url, path);
        tracing::debug!(%method, %url, "Dashboard request");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::network(format!("Network error: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read response: {}", e)))?;
        let value: Value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if status.is_success() {
            return Ok(value);
        }

        let message = value
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        Err(ApiError::status(status.as_u16(), message))
    }
}

/// Typed client for every endpoint the dashboard and forms use.
pub struct AdminClient<T> {
    transport: T,
}

impl<T: Transport> AdminClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<R, ApiError> {
        let value = self.transport.send(method, path, body).await?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::network(format!("Unexpected response from {}: {}", path, e)))
    }

    async fn call_with<B: Serialize, R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::network(format!("Failed to encode request: {}", e)))?;
        self.call(method, path, Some(body)).await
    }

    // ==== SESSION ====

    pub async fn session(&self) -> Result<SessionResponse, ApiError> {
        self.call(Method::GET, "users/session", None).await
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<User, ApiError> {
        let request = LoginRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.call_with(Method::POST, "users/verify", &request).await?;
        Ok(response.user)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let _: MessageResponse = self.call(Method::POST, "users/logout", None).await?;
        Ok(())
    }

    // ==== LISTS ====

    pub async fn list(&self, tab: Tab) -> Result<TabRows, ApiError> {
        let path = format!("{}/getAll", tab.resource());
        let rows = match tab {
            Tab::Users => TabRows::Users(self.call(Method::GET, &path, None).await?),
            Tab::Products => TabRows::Products(self.call(Method::GET, &path, None).await?),
            Tab::Services => TabRows::Services(self.call(Method::GET, &path, None).await?),
            Tab::Blogs => TabRows::Blogs(self.call(Method::GET, &path, None).await?),
            Tab::Queries => TabRows::Queries(self.call(Method::GET, &path, None).await?),
            Tab::Logs => TabRows::Logs(self.call(Method::GET, &path, None).await?),
        };
        Ok(rows)
    }

    pub async fn delete(&self, tab: Tab, id: &str) -> Result<MessageResponse, ApiError> {
        let path = format!("{}/delete/{}", tab.resource(), id);
        self.call(Method::DELETE, &path, None).await
    }

    // ==== USERS ====

    pub async fn get_user(&self, id: i64) -> Result<User, ApiError> {
        self.call(Method::GET, &format!("users/getById/{}", id), None)
            .await
    }

    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<User, ApiError> {
        self.call_with(Method::POST, "users/create", request).await
    }

    pub async fn update_password(&self, id: i64, password: &str) -> Result<String, ApiError> {
        let request = UpdatePasswordRequest {
            password: password.to_string(),
        };
        let response: MessageResponse = self
            .call_with(Method::PUT, &format!("users/updatePassword/{}", id), &request)
            .await?;
        Ok(response.message)
    }

    pub async fn retrieve_password(&self, id: i64) -> Result<String, ApiError> {
        let response: MessageResponse = self
            .call(Method::POST, &format!("users/retrievePassword/{}", id), None)
            .await?;
        Ok(response.message)
    }

    pub async fn update_permissions(
        &self,
        id: i64,
        permissions: &PermissionMatrix,
    ) -> Result<User, ApiError> {
        let request = UpdatePermissionsRequest {
            permissions: permissions.clone(),
        };
        self.call_with(
            Method::PUT,
            &format!("users/updateUserPermissions/{}", id),
            &request,
        )
        .await
    }

    // ==== CATALOG AND BLOGS ====

    pub async fn create_item(
        &self,
        kind: CatalogKind,
        request: &CreateCatalogItemRequest,
    ) -> Result<CatalogItem, ApiError> {
        self.call_with(Method::POST, &format!("{}/create", kind.table()), request)
            .await
    }

    pub async fn update_item(
        &self,
        kind: CatalogKind,
        id: i64,
        request: &UpdateCatalogItemRequest,
    ) -> Result<CatalogItem, ApiError> {
        self.call_with(
            Method::PUT,
            &format!("{}/update/{}", kind.table(), id),
            request,
        )
        .await
    }

    pub async fn create_blog(&self, request: &CreateBlogRequest) -> Result<Blog, ApiError> {
        self.call_with(Method::POST, "blogs/create", request).await
    }

    pub async fn update_blog(&self, id: i64, request: &UpdateBlogRequest) -> Result<Blog, ApiError> {
        self.call_with(Method::PUT, &format!("blogs/update/{}", id), request)
            .await
    }

    // ==== QUERIES ====

    pub async fn update_query_status(&self, id: &str, status: &str) -> Result<Query, ApiError> {
        let request = UpdateStatusRequest {
            status: status.to_string(),
        };
        self.call_with(Method::PUT, &format!("query/updateStatus/{}", id), &request)
            .await
    }

    pub async fn submit_query(
        &self,
        query_type: QueryType,
        request: &SubmitQueryRequest,
    ) -> Result<Query, ApiError> {
        self.call_with(Method::POST, &format!("query/{}", query_type.route()), request)
            .await
    }

    // ==== VERIFICATION ====

    pub async fn send_otp(&self, email: &str) -> Result<(), ApiError> {
        let request = SendOtpRequest {
            email: email.to_string(),
        };
        let _: MessageResponse = self.call_with(Method::POST, "send-otp", &request).await?;
        Ok(())
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<bool, ApiError> {
        let request = VerifyOtpRequest {
            email: email.to_string(),
            otp: otp.to_string(),
        };
        let response: VerificationResponse =
            self.call_with(Method::POST, "verify-otp", &request).await?;
        Ok(response.success)
    }

    /// Check a CAPTCHA token; a pass clears `email` for one `send_otp`.
    pub async fn verify_captcha(&self, email: &str, token: &str) -> Result<bool, ApiError> {
        let request = VerifyCaptchaRequest {
            email: email.to_string(),
            token: token.to_string(),
        };
        let response: VerificationResponse =
            self.call_with(Method::POST, "verify-captcha", &request).await?;
        Ok(response.success)
    }
}
