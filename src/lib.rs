//! Drone Site Backend
//!
//! REST backend for the drone company website: public catalog and contact
//! forms, plus the permission-gated admin API with SQLite persistence. The
//! [`dashboard`] module holds the admin client logic that drives this API.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod errors;
pub mod models;
pub mod validation;
pub mod verification;

use std::sync::Arc;

use axum::{
    http::{header, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use catalog::PublicCatalog;
use config::Config;
use db::Repository;
use verification::Verifier;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub verifier: Arc<Verifier>,
    pub catalog: Arc<PublicCatalog>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS: only configured origins, with the session cookie
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(state.config.cors_origins.clone()))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    // Admin routes (session required)
    let admin_routes = Router::new()
        // Users
        .route("/users/getAll", get(api::list_users))
        .route("/users/getById/{id}", get(api::get_user))
        .route("/users/create", post(api::create_user))
        .route("/users/delete/{id}", delete(api::delete_user))
        .route("/users/updatePassword/{id}", put(api::update_password))
        .route("/users/retrievePassword/{id}", post(api::retrieve_password))
        .route(
            "/users/updateUserPermissions/{id}",
            put(api::update_user_permissions),
        )
        // Products
        .route("/products/getAll", get(api::list_products))
        .route("/products/getById/{id}", get(api::get_product))
        .route("/products/create", post(api::create_product))
        .route("/products/update/{id}", put(api::update_product))
        .route("/products/delete/{id}", delete(api::delete_product))
        // Services
        .route("/services/getAll", get(api::list_services))
        .route("/services/getById/{id}", get(api::get_service))
        .route("/services/create", post(api::create_service))
        .route("/services/update/{id}", put(api::update_service))
        .route("/services/delete/{id}", delete(api::delete_service))
        // Blogs
        .route("/blogs/getAll", get(api::list_blogs))
        .route("/blogs/getById/{id}", get(api::get_blog))
        .route("/blogs/create", post(api::create_blog))
        .route("/blogs/update/{id}", put(api::update_blog))
        .route("/blogs/delete/{id}", delete(api::delete_blog))
        // Queries
        .route("/query/getAll", get(api::list_queries))
        .route("/query/getById/{id}", get(api::get_query))
        .route("/query/delete/{id}", delete(api::delete_query))
        .route("/query/updateStatus/{id}", put(api::update_query_status))
        // Logs
        .route("/logs/getAll", get(api::list_logs))
        .route("/logs/delete/{id}", delete(api::delete_log))
        // Apply session auth middleware
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_auth_layer,
        ));

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/users/session", get(api::get_session))
        .route("/users/verify", post(api::login))
        .route("/users/logout", post(api::logout))
        .route("/query/products/{form}", post(api::submit_product_query))
        .route("/query/services/{form}", post(api::submit_service_query))
        .route("/send-otp", post(api::send_otp))
        .route("/verify-otp", post(api::verify_otp))
        .route("/verify-captcha", post(api::verify_captcha))
        .route("/catalog/products", get(api::public_products))
        .route("/catalog/services", get(api::public_services));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", admin_routes.merge(public_routes))
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
