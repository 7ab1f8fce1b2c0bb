use std::path::PathBuf;

use storefront_core::image_url::{DeploymentMode, UrlPolicy};

use crate::auth::jwt::JwtConfig;

/// Staff account created at startup if it does not exist yet.
#[derive(Debug, Clone)]
pub struct StaffAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Development or production (`APP_ENV`).
    pub mode: DeploymentMode,
    /// Base URL for image links built without a request (`PUBLIC_BASE_URL`).
    pub public_base_url: String,
    /// Directory uploaded images are written to (`MEDIA_ROOT`).
    pub media_root: PathBuf,
    /// Largest accepted request body, in bytes (`MAX_UPLOAD_BYTES`).
    pub max_upload_bytes: usize,
    /// Honour `X-Forwarded-Host` / `X-Forwarded-Proto` (`TRUST_PROXY_HEADERS`).
    /// Enable only behind a proxy that overwrites them.
    pub trust_proxy_headers: bool,
    /// PostgreSQL URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// JWT token configuration.
    pub jwt: JwtConfig,
    /// Optional staff account seeded at startup.
    pub bootstrap_staff: Option<StaffAccount>,
}

/// URL prefix under which `media_root` is served.
pub const MEDIA_URL_PREFIX: &str = "/media";

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                                          |
    /// |------------------------|--------------------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                                        |
    /// | `PORT`                 | `3000`                                           |
    /// | `CORS_ORIGINS`         | `http://localhost:5173,http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                             |
    /// | `APP_ENV`              | `production`                                     |
    /// | `PUBLIC_BASE_URL`      | `https://shop.example.com`                       |
    /// | `MEDIA_ROOT`           | `media`                                          |
    /// | `MAX_UPLOAD_BYTES`     | `10485760`                                       |
    /// | `TRUST_PROXY_HEADERS`  | `false`                                          |
    /// | `DATABASE_URL`         | unset (in-memory store)                          |
    /// | `ADMIN_USERNAME` / `ADMIN_EMAIL` / `ADMIN_PASSWORD` | unset               |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let mode = DeploymentMode::parse(
            &std::env::var("APP_ENV").unwrap_or_else(|_| "production".into()),
        );

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "https://shop.example.com".into());

        let media_root = PathBuf::from(std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".into()));

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| "10485760".into())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let trust_proxy_headers = std::env::var("TRUST_PROXY_HEADERS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let bootstrap_staff = match (
            std::env::var("ADMIN_USERNAME"),
            std::env::var("ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                let email = std::env::var("ADMIN_EMAIL")
                    .unwrap_or_else(|_| format!("{username}@localhost"));
                Some(StaffAccount {
                    username,
                    email,
                    password,
                })
            }
            _ => None,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            mode,
            public_base_url,
            media_root,
            max_upload_bytes,
            trust_proxy_headers,
            database_url,
            jwt: JwtConfig::from_env(),
            bootstrap_staff,
        }
    }

    /// Inputs for image URL resolution.
    pub fn url_policy(&self) -> UrlPolicy {
        UrlPolicy {
            mode: self.mode,
            public_base_url: self.public_base_url.clone(),
        }
    }
}
