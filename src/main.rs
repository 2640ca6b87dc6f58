//! Drone Site Backend server binary.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use drone_site_backend::auth;
use drone_site_backend::catalog::PublicCatalog;
use drone_site_backend::config::{Config, LogFormat};
use drone_site_backend::db::{self, Repository};
use drone_site_backend::errors::AppError;
use drone_site_backend::verification::{HttpCaptchaVerifier, LogMailer, Verifier};
use drone_site_backend::{create_router, AppState};

/// How often expired sessions are swept from the database.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting Drone Site Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Catalog path: {:?}", config.catalog_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.captcha_secret.is_none() {
        tracing::warn!(
            "No CAPTCHA secret configured (DRONE_CAPTCHA_SECRET). Detail forms cannot be verified!"
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    seed_root_admin(&repo, &config).await?;

    let catalog = Arc::new(PublicCatalog::load(&config.catalog_path).await?);
    tracing::info!(
        "Catalog loaded with {} products and {} services",
        catalog.products.len(),
        catalog.services.len()
    );

    let captcha = HttpCaptchaVerifier::new(
        config.captcha_secret.clone(),
        config.captcha_verify_url.clone(),
    )?;
    let verifier = Arc::new(Verifier::new(
        config.otp_ttl,
        Arc::new(LogMailer),
        Arc::new(captcha),
    ));

    spawn_session_sweeper(repo.clone());

    // Create application state
    let state = AppState {
        repo,
        verifier,
        catalog,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create or refresh the root admin (user id 1) from configuration.
async fn seed_root_admin(repo: &Repository, config: &Config) -> Result<(), AppError> {
    let admin = &config.root_admin;
    let Some(password) = &admin.password else {
        tracing::warn!(
            "No root admin password configured (DRONE_ADMIN_PASSWORD). Root admin not seeded!"
        );
        return Ok(());
    };

    let hash = auth::hash_password(password, config.bcrypt_cost).await?;
    let root = repo
        .ensure_root_user(&admin.username, &admin.email, &hash)
        .await?;
    tracing::info!("Root admin is '{}'", root.username);
    Ok(())
}

fn spawn_session_sweeper(repo: Arc<Repository>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match repo.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("Purged {} expired sessions", n),
                Err(e) => tracing::warn!("Failed to purge expired sessions: {}", e),
            }
        }
    });
}

