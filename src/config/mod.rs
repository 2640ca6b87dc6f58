//! Configuration module for the drone site backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;

use crate::errors::AppError;

/// Default reCAPTCHA-compatible verification endpoint.
pub const DEFAULT_CAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Credentials used to seed the root admin (user id 1).
#[derive(Debug, Clone)]
pub struct RootAdmin {
    pub username: String,
    pub email: String,
    /// Seeding is skipped when no password is configured.
    pub password: Option<String>,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to the static public catalog (products and services)
    pub catalog_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Lifetime of a login session
    pub session_ttl: Duration,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
    pub root_admin: RootAdmin,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
    /// Lifetime of an emailed one-time password
    pub otp_ttl: Duration,
    /// Secret shared with the CAPTCHA provider; verification fails closed without it
    pub captcha_secret: Option<String>,
    pub captcha_verify_url: String,
    /// Origins allowed to call the API with credentials; empty means same-origin only
    pub cors_origins: Vec<HeaderValue>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("DRONE_DB_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let catalog_path = env::var("DRONE_CATALOG_PATH")
            .unwrap_or_else(|_| "./data/catalog.json".to_string())
            .into();

        let bind_addr = parse_var("DRONE_BIND_ADDR", "127.0.0.1:8080")?;

        let log_level = env::var("DRONE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("DRONE_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("text") | Err(_) => LogFormat::Text,
            Ok(other) => {
                return Err(AppError::Internal(format!(
                    "Invalid DRONE_LOG_FORMAT '{}': expected text or json",
                    other
                )))
            }
        };

        let session_ttl_hours: u64 = parse_var("DRONE_SESSION_TTL_HOURS", "24")?;
        let cookie_secure: bool = parse_var("DRONE_COOKIE_SECURE", "false")?;

        let root_admin = RootAdmin {
            username: env::var("DRONE_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            email: env::var("DRONE_ADMIN_EMAIL").unwrap_or_else(|_| "admin@localhost".to_string()),
            password: env::var("DRONE_ADMIN_PASSWORD").ok(),
        };

        let bcrypt_cost = parse_var("DRONE_BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string())?;
        let otp_ttl_secs: u64 = parse_var("DRONE_OTP_TTL_SECS", "300")?;

        let captcha_secret = env::var("DRONE_CAPTCHA_SECRET").ok();
        let captcha_verify_url = env::var("DRONE_CAPTCHA_VERIFY_URL")
            .unwrap_or_else(|_| DEFAULT_CAPTCHA_VERIFY_URL.to_string());

        let cors_origins = parse_origins(&env::var("DRONE_CORS_ORIGINS").unwrap_or_default())?;

        Ok(Self {
            db_path,
            catalog_path,
            bind_addr,
            log_level,
            log_format,
            session_ttl: Duration::from_secs(session_ttl_hours * 3600),
            cookie_secure,
            root_admin,
            bcrypt_cost,
            otp_ttl: Duration::from_secs(otp_ttl_secs),
            captcha_secret,
            captcha_verify_url,
            cors_origins,
        })
    }
}

/// Split a comma-separated origin list such as `https://admin.example.in`.
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            if origin == "*" {
                return Err(AppError::Internal(
                    "Invalid DRONE_CORS_ORIGINS: '*' cannot be used with session cookies"
                        .to_string(),
                ));
            }
            HeaderValue::from_str(origin.trim_end_matches('/')).map_err(|e| {
                AppError::Internal(format!("Invalid DRONE_CORS_ORIGINS entry '{}': {}", origin, e))
            })
        })
        .collect()
}

/// Read a variable and parse it, falling back to `default` when unset.
fn parse_var<T>(name: &str, default: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|e| AppError::Internal(format!("Invalid {} '{}': {}", name, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both cases live in one test since they mutate the process environment.
    #[test]
    fn test_config_from_env() {
        for var in [
            "DRONE_DB_PATH",
            "DRONE_CATALOG_PATH",
            "DRONE_BIND_ADDR",
            "DRONE_LOG_LEVEL",
            "DRONE_LOG_FORMAT",
            "DRONE_SESSION_TTL_HOURS",
            "DRONE_COOKIE_SECURE",
            "DRONE_ADMIN_PASSWORD",
            "DRONE_BCRYPT_COST",
            "DRONE_OTP_TTL_SECS",
            "DRONE_CAPTCHA_SECRET",
            "DRONE_CORS_ORIGINS",
        ] {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();

        assert_eq!(config.db_path, PathBuf::from("./data/app.sqlite"));
        assert_eq!(config.catalog_path, PathBuf::from("./data/catalog.json"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.session_ttl, Duration::from_secs(24 * 3600));
        assert!(!config.cookie_secure);
        assert!(config.root_admin.password.is_none());
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.otp_ttl, Duration::from_secs(300));
        assert!(config.captcha_secret.is_none());
        assert_eq!(config.captcha_verify_url, DEFAULT_CAPTCHA_VERIFY_URL);
        assert!(config.cors_origins.is_empty());

        env::set_var(
            "DRONE_CORS_ORIGINS",
            "https://admin.drones.in/, http://localhost:5173",
        );
        let config = Config::from_env().unwrap();
        assert_eq!(
            config.cors_origins,
            vec![
                HeaderValue::from_static("https://admin.drones.in"),
                HeaderValue::from_static("http://localhost:5173"),
            ]
        );
        env::set_var("DRONE_CORS_ORIGINS", "*");
        assert!(Config::from_env().is_err());
        env::remove_var("DRONE_CORS_ORIGINS");

        env::set_var("DRONE_BIND_ADDR", "not-an-address");
        let err = Config::from_env().unwrap_err();
        assert!(err.message().contains("DRONE_BIND_ADDR"));
        env::remove_var("DRONE_BIND_ADDR");
    }
}
