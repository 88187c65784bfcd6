//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - MongoDB connection string
//! - `JWT_SECRET` - Secret used to sign admin tokens
//!
//! ## Optional
//! - `DATABASE_NAME` - Database to use (default: junhae-edits)
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 5000)
//! - `FRONTEND_URL` - Origin allowed by CORS (default: any origin)
//! - `PUBLIC_URL` - Base URL used in uploaded file links (default: http://HOST:PORT)
//! - `UPLOAD_DIR` - Directory for uploaded images (default: uploads)
//! - `ADMIN_EMAIL`, `ADMIN_PASSWORD` - Dashboard login, seeded when both are set

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_DATABASE_NAME: &str = "junhae-edits";
const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_name: String,
    pub host: IpAddr,
    pub port: u16,
    pub frontend_url: Option<String>,
    pub public_url: String,
    pub upload_dir: PathBuf,
    pub jwt_secret: String,
    pub admin: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes `std::env`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let host = match get("HOST") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("HOST".into(), format!("{raw} is not an IP address")))?,
            None => IpAddr::from([127, 0, 0, 1]),
        };
        let port = match get("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("PORT".into(), format!("{raw} is not a port number")))?,
            None => DEFAULT_PORT,
        };

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email: email.trim().to_lowercase(),
                password,
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::InvalidEnvVar(
                    "ADMIN_EMAIL".into(),
                    "ADMIN_EMAIL and ADMIN_PASSWORD must be set together".into(),
                ))
            }
        };

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            database_name: get("DATABASE_NAME").unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
            host,
            port,
            frontend_url: get("FRONTEND_URL"),
            public_url: get("PUBLIC_URL").unwrap_or_else(|| format!("http://{host}:{port}")),
            upload_dir: get("UPLOAD_DIR").map_or_else(|| PathBuf::from("uploads"), PathBuf::from),
            jwt_secret: required("JWT_SECRET")?,
            admin,
        })
    }
}
