//! Form controllers: admin login and create/edit forms, plus the public
//! contact forms with their CAPTCHA and OTP steps.
//!
//! Every form validates locally first. A form that fails local validation
//! never issues a request.

use serde_json::{Map, Value};

use super::client::{AdminClient, Transport};
use super::permission_editor::Banner;
use super::session_gate::SessionGate;
use super::Route;
use crate::models::{
    Blog, CatalogItem, CatalogKind, CreateBlogRequest, CreateCatalogItemRequest,
    CreateUserRequest, Flag, PermissionMatrix, Query, QueryType, SubmitQueryRequest,
    UpdateBlogRequest, UpdateCatalogItemRequest, User,
};
use crate::validation::{self, FieldClass, FieldError};

/// Admin login form.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub identifier: String,
    pub password: String,
    error: Option<String>,
}

impl LoginForm {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Log in and return the view to navigate to.
    pub async fn submit<T: Transport>(
        &mut self,
        client: &AdminClient<T>,
        gate: &mut SessionGate,
    ) -> Option<Route> {
        let identifier = self.identifier.trim();
        if identifier.is_empty() || self.password.is_empty() {
            self.error = Some("Please enter your username or email and password".to_string());
            return None;
        }

        match client.login(identifier, &self.password).await {
            Ok(user) => {
                gate.authenticated(user);
                self.password.clear();
                self.error = None;
                Some(Route::Dashboard)
            }
            Err(e) => {
                self.error = Some(e.message);
                None
            }
        }
    }
}

/// Create-user form with its own permission matrix.
#[derive(Debug, Clone, Default)]
pub struct CreateUserForm {
    pub username: String,
    pub email: String,
    pub password: String,
    permissions: PermissionMatrix,
    error: Option<String>,
    banner: Option<Banner>,
}

impl CreateUserForm {
    /// A form with every permission unchecked.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn permissions(&self) -> &PermissionMatrix {
        &self.permissions
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// Apply one checkbox change. Returns `false` if it was rejected.
    pub fn toggle(&mut self, flag: Flag, checked: bool) -> bool {
        match self.permissions.set(flag, checked) {
            Ok(()) => {
                self.error = None;
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }

    fn check(&self) -> Result<(), String> {
        validation::require("username", self.username.trim(), FieldClass::Name)
            .and_then(|_| validation::email("email", self.email.trim()))
            .and_then(|_| validation::password("password", &self.password))
            .map_err(|e| e.to_string())?;
        self.permissions.validate().map_err(|e| e.to_string())
    }

    /// On failure the server's message is bannered and the fields are kept.
    pub async fn submit<T: Transport>(&mut self, client: &AdminClient<T>) -> Option<User> {
        if let Err(message) = self.check() {
            self.error = Some(message);
            return None;
        }
        self.error = None;

        let request = CreateUserRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            permissions: self.permissions.clone(),
        };

        match client.create_user(&request).await {
            Ok(user) => {
                *self = Self {
                    banner: Some(Banner::Success(format!("User {} created", user.username))),
                    ..Self::default()
                };
                Some(user)
            }
            Err(e) => {
                self.banner = Some(Banner::Failure(e.message));
                None
            }
        }
    }
}

/// Create or edit form for a product or service.
#[derive(Debug, Clone)]
pub struct CatalogForm {
    kind: CatalogKind,
    id: Option<i64>,
    pub title: String,
    pub description: String,
    pub main_image: String,
    error: Option<String>,
    banner: Option<Banner>,
}

impl CatalogForm {
    pub fn create(kind: CatalogKind) -> Self {
        Self {
            kind,
            id: None,
            title: String::new(),
            description: String::new(),
            main_image: String::new(),
            error: None,
            banner: None,
        }
    }

    pub fn edit(kind: CatalogKind, item: &CatalogItem) -> Self {
        Self {
            id: Some(item.id),
            title: item.title.clone(),
            description: item.description.clone(),
            main_image: item.main_image.clone(),
            ..Self::create(kind)
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    fn check(&self) -> Result<(), FieldError> {
        validation::require("title", &self.title, FieldClass::ShortText)?;
        validation::require("description", &self.description, FieldClass::LongText)?;
        validation::limit("mainImage", &self.main_image, FieldClass::ShortText)
    }

    pub async fn submit<T: Transport>(&mut self, client: &AdminClient<T>) -> Option<CatalogItem> {
        if let Err(e) = self.check() {
            self.error = Some(e.to_string());
            return None;
        }
        self.error = None;

        let result = match self.id {
            None => {
                let request = CreateCatalogItemRequest {
                    title: self.title.clone(),
                    description: self.description.clone(),
                    main_image: self.main_image.clone(),
                };
                client.create_item(self.kind, &request).await
            }
            Some(id) => {
                let request = UpdateCatalogItemRequest {
                    title: Some(self.title.clone()),
                    description: Some(self.description.clone()),
                    main_image: Some(self.main_image.clone()),
                };
                client.update_item(self.kind, id, &request).await
            }
        };

        match result {
            Ok(item) => {
                self.id = Some(item.id);
                self.banner = Some(Banner::Success(format!("{} saved", self.kind.label())));
                Some(item)
            }
            Err(e) => {
                self.banner = Some(Banner::Failure(e.message));
                None
            }
        }
    }
}

/// Create or edit form for a blog post.
#[derive(Debug, Clone, Default)]
pub struct BlogForm {
    id: Option<i64>,
    pub title: String,
    pub image: String,
    pub body_content: String,
    error: Option<String>,
    banner: Option<Banner>,
}

impl BlogForm {
    pub fn edit(blog: &Blog) -> Self {
        Self {
            id: Some(blog.id),
            title: blog.title.clone(),
            image: blog.image.clone(),
            body_content: blog.body_content.clone(),
            ..Self::default()
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    fn check(&self) -> Result<(), FieldError> {
        validation::require("title", &self.title, FieldClass::ShortText)?;
        validation::limit("image", &self.image, FieldClass::ShortText)?;
        if self.body_content.trim().is_empty() {
            return Err(FieldError::new("bodyContent", "is required"));
        }
        Ok(())
    }

    pub async fn submit<T: Transport>(&mut self, client: &AdminClient<T>) -> Option<Blog> {
        if let Err(e) = self.check() {
            self.error = Some(e.to_string());
            return None;
        }
        self.error = None;

        let result = match self.id {
            None => {
                let request = CreateBlogRequest {
                    title: self.title.clone(),
                    image: self.image.clone(),
                    body_content: self.body_content.clone(),
                };
                client.create_blog(&request).await
            }
            Some(id) => {
                let request = UpdateBlogRequest {
                    title: Some(self.title.clone()),
                    image: Some(self.image.clone()),
                    body_content: Some(self.body_content.clone()),
                };
                client.update_blog(id, &request).await
            }
        };

        match result {
            Ok(blog) => {
                self.id = Some(blog.id);
                self.banner = Some(Banner::Success("Blog saved".to_string()));
                Some(blog)
            }
            Err(e) => {
                self.banner = Some(Banner::Failure(e.message));
                None
            }
        }
    }
}

/// Fields shared by every public contact form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub data: Map<String, Value>,
}

impl ContactFields {
    pub fn validate(&self) -> Result<(), FieldError> {
        validation::contact(self.name.trim(), self.email.trim(), self.phone.trim())
    }

    fn request(&self) -> SubmitQueryRequest {
        SubmitQueryRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            data: self.data.clone(),
        }
    }
}

/// General enquiry form: validate, then submit directly.
#[derive(Debug, Clone)]
pub struct GeneralForm {
    query_type: QueryType,
    pub fields: ContactFields,
    error: Option<String>,
    submitted: Option<Query>,
}

impl GeneralForm {
    pub fn new(query_type: QueryType) -> Self {
        Self {
            query_type,
            fields: ContactFields::default(),
            error: None,
            submitted: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn submitted(&self) -> Option<&Query> {
        self.submitted.as_ref()
    }

    pub async fn submit<T: Transport>(&mut self, client: &AdminClient<T>) -> Option<Query> {
        if let Err(e) = self.fields.validate() {
            self.error = Some(e.to_string());
            return None;
        }

        match client.submit_query(self.query_type, &self.fields.request()).await {
            Ok(query) => {
                self.error = None;
                self.fields = ContactFields::default();
                self.submitted = Some(query.clone());
                Some(query)
            }
            Err(e) => {
                self.error = Some(e.message);
                None
            }
        }
    }
}

/// Where a detail form is in its verification flow.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailStep {
    Editing,
    CaptchaVerified,
    /// The OTP modal is open.
    OtpSent,
    Submitted(Query),
}

/// Detail form: CAPTCHA, then an emailed OTP, then exactly one submit.
///
/// Each server step is cleared for one email only, so the fields are checked
/// again before every call and an email change sends the visitor back to the
/// CAPTCHA.
#[derive(Debug, Clone)]
pub struct DetailForm {
    query_type: QueryType,
    pub fields: ContactFields,
    captcha_token: Option<String>,
    verified_email: Option<String>,
    step: DetailStep,
    error: Option<String>,
}

impl DetailForm {
    pub fn new(query_type: QueryType) -> Self {
        Self {
            query_type,
            fields: ContactFields::default(),
            captcha_token: None,
            verified_email: None,
            step: DetailStep::Editing,
            error: None,
        }
    }

    pub fn step(&self) -> &DetailStep {
        &self.step
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn captcha_token(&self) -> Option<&str> {
        self.captcha_token.as_deref()
    }

    pub fn show_otp_modal(&self) -> bool {
        self.step == DetailStep::OtpSent
    }

    /// Drop any verification progress and go back to the CAPTCHA.
    fn restart(&mut self, error: String) {
        self.captcha_token = None;
        self.verified_email = None;
        self.step = DetailStep::Editing;
        self.error = Some(error);
    }

    /// Fields still valid and email unchanged since the CAPTCHA.
    fn recheck(&mut self) -> bool {
        if let Err(e) = self.fields.validate() {
            self.error = Some(e.to_string());
            return false;
        }
        if self.verified_email.as_deref() != Some(self.fields.email.trim()) {
            self.restart("Email changed. Please complete the CAPTCHA again".to_string());
            return false;
        }
        true
    }

    /// Check the fields, then the CAPTCHA token from the widget.
    pub async fn verify_captcha<T: Transport>(&mut self, client: &AdminClient<T>, token: &str) -> bool {
        if let Err(e) = self.fields.validate() {
            self.error = Some(e.to_string());
            return false;
        }

        let email = self.fields.email.trim().to_string();
        let verified = match client.verify_captcha(&email, token).await {
            Ok(success) => success,
            Err(e) => {
                tracing::debug!("CAPTCHA rejected: {}", e);
                false
            }
        };

        if verified {
            self.captcha_token = Some(token.to_string());
            self.verified_email = Some(email);
            self.step = DetailStep::CaptchaVerified;
            self.error = None;
        } else {
            self.restart("CAPTCHA verification failed. Please try again".to_string());
        }
        verified
    }

    /// Mail an OTP. The modal opens only once the send succeeded.
    ///
    /// Each CAPTCHA pass covers one send; a failed send needs a new CAPTCHA.
    pub async fn send_otp<T: Transport>(&mut self, client: &AdminClient<T>) -> bool {
        if self.step != DetailStep::CaptchaVerified {
            self.error = Some("Please complete the CAPTCHA first".to_string());
            return false;
        }
        if !self.recheck() {
            return false;
        }

        match client.send_otp(self.fields.email.trim()).await {
            Ok(()) => {
                self.step = DetailStep::OtpSent;
                self.error = None;
                true
            }
            Err(e) => {
                self.restart(e.message);
                false
            }
        }
    }

    /// Close the OTP modal without submitting. A new code needs a new CAPTCHA.
    pub fn close_otp_modal(&mut self) {
        if self.step == DetailStep::OtpSent {
            self.captcha_token = None;
            self.verified_email = None;
            self.step = DetailStep::Editing;
        }
    }

    /// Check the OTP and, only if it matches, submit the form once.
    pub async fn verify_otp<T: Transport>(&mut self, client: &AdminClient<T>, otp: &str) -> Option<Query> {
        if self.step != DetailStep::OtpSent {
            self.error = Some("Please request an OTP first".to_string());
            return None;
        }
        let otp = otp.trim();
        if otp.is_empty() {
            self.error = Some("Please enter the OTP".to_string());
            return None;
        }
        if !self.recheck() {
            return None;
        }

        match client.verify_otp(self.fields.email.trim(), otp).await {
            Ok(true) => {}
            Ok(false) => {
                self.error = Some("Invalid or expired OTP".to_string());
                return None;
            }
            Err(e) => {
                self.error = Some(e.message);
                return None;
            }
        }

        match client.submit_query(self.query_type, &self.fields.request()).await {
            Ok(query) => {
                self.error = None;
                self.step = DetailStep::Submitted(query.clone());
                Some(query)
            }
            Err(e) => {
                // The verification is spent; start over from the CAPTCHA.
                self.restart(e.message);
                None
            }
        }
    }
}
