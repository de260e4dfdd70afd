//! Configuration module
//!
//! Configuration is read once at startup from the environment (and an optional `.env`
//! file), validated, and then injected everywhere it is needed. Nothing in the upload
//! pipeline reads environment variables directly.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::MediaKind;
use crate::storage_types::{StagingMode, StorageBackend};

const SERVER_PORT: u16 = 8091;
const MAX_CONNECTIONS: u32 = 20;
const THUMBNAIL_MAX_BYTES: u64 = 10 << 20;
const VIDEO_MAX_BYTES: u64 = 1 << 30;
const STORAGE_TIMEOUT_SECS: u64 = 300;
const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub jwt_secret: String,
    /// Base of every URL handed out for local and memory objects, without trailing slash.
    pub public_base_url: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub assets_root: PathBuf,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    // Upload pipeline
    pub staging_dir: PathBuf,
    pub thumbnail_max_bytes: u64,
    pub video_max_bytes: u64,
    pub thumbnail_staging: StagingMode,
    pub video_staging: StagingMode,
    pub storage_timeout_secs: u64,
    // Metadata store; in-memory when unset
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub log_json: bool,
}

impl Config {
    /// Development defaults with the given JWT secret. Used as the base of [`Config::from_env`]
    /// and directly by tests.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            jwt_secret: jwt_secret.into(),
            public_base_url: format!("http://localhost:{}", SERVER_PORT),
            storage_backend: StorageBackend::Local,
            assets_root: PathBuf::from("./assets"),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            staging_dir: env::temp_dir(),
            thumbnail_max_bytes: THUMBNAIL_MAX_BYTES,
            video_max_bytes: VIDEO_MAX_BYTES,
            thumbnail_staging: StagingMode::Memory,
            video_staging: StagingMode::File,
            storage_timeout_secs: STORAGE_TIMEOUT_SECS,
            database_url: None,
            db_max_connections: MAX_CONNECTIONS,
            log_json: false,
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?;
        let mut config = Self::new(jwt_secret);

        config.server_port = parse_var("PORT", env::var("PORT").ok(), SERVER_PORT)?;
        config.environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());
        config.public_base_url = env::var("PUBLIC_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("http://localhost:{}", config.server_port));

        if let Ok(backend) = env::var("STORAGE_BACKEND") {
            config.storage_backend = backend.parse()?;
        }
        if let Ok(root) = env::var("ASSETS_ROOT") {
            config.assets_root = PathBuf::from(root);
        }
        config.s3_bucket = env::var("S3_BUCKET").ok();
        config.s3_region = env::var("S3_REGION")
            .or_else(|_| env::var("AWS_REGION"))
            .ok();
        config.s3_endpoint = env::var("S3_ENDPOINT").ok();

        if let Ok(dir) = env::var("STAGING_DIR") {
            config.staging_dir = PathBuf::from(dir);
        }
        config.thumbnail_max_bytes = parse_var(
            "THUMBNAIL_MAX_BYTES",
            env::var("THUMBNAIL_MAX_BYTES").ok(),
            THUMBNAIL_MAX_BYTES,
        )?;
        config.video_max_bytes = parse_var(
            "VIDEO_MAX_BYTES",
            env::var("VIDEO_MAX_BYTES").ok(),
            VIDEO_MAX_BYTES,
        )?;
        if let Ok(mode) = env::var("THUMBNAIL_STAGING") {
            config.thumbnail_staging = mode.parse()?;
        }
        if let Ok(mode) = env::var("VIDEO_STAGING") {
            config.video_staging = mode.parse()?;
        }
        config.storage_timeout_secs = parse_var(
            "STORAGE_TIMEOUT_SECS",
            env::var("STORAGE_TIMEOUT_SECS").ok(),
            STORAGE_TIMEOUT_SECS,
        )?;

        config.database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        config.db_max_connections = parse_var(
            "DB_MAX_CONNECTIONS",
            env::var("DB_MAX_CONNECTIONS").ok(),
            MAX_CONNECTIONS,
        )?;
        config.log_json = env::var("LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            ));
        }

        if self.thumbnail_max_bytes == 0 || self.video_max_bytes == 0 {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_MAX_BYTES and VIDEO_MAX_BYTES must be greater than zero"
            ));
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.storage_backend == StorageBackend::S3 {
            if self.s3_bucket.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_BUCKET must be set when using S3 storage backend"
                ));
            }
            if self.s3_region.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                ));
            }
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Size ceiling for uploads of the given kind.
    pub fn max_bytes_for(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Thumbnail => self.thumbnail_max_bytes,
            MediaKind::Video => self.video_max_bytes,
        }
    }

    pub fn staging_mode_for(&self, kind: MediaKind) -> StagingMode {
        match kind {
            MediaKind::Thumbnail => self.thumbnail_staging,
            MediaKind::Video => self.video_staging,
        }
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_secs)
    }
}

/// Parse an optional numeric setting. Unset falls back to `default`; a malformed value is a
/// startup error rather than a silent default.
fn parse_var<T: std::str::FromStr>(
    name: &str,
    value: Option<String>,
    default: T,
) -> Result<T, anyhow::Error> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got '{}'", name, raw)),
    }
}
