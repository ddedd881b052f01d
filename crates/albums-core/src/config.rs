//! Configuration module
//!
//! Server, database, storage and import-pipeline settings, read from the
//! environment (and an optional `.env` file).

use std::env;
use std::path::PathBuf;

use crate::constants::{DEFAULT_IMAGE_EXTENSIONS, MIN_CHUNK_SIZE};
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_IMAGE_SIZE_MB: usize = 10;
const MAX_ARCHIVE_SIZE_MB: usize = 200;
const IMPORT_CHUNK_SIZE_KB: usize = 64;

/// Server-level configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

/// Album service configuration
#[derive(Clone, Debug)]
pub struct AlbumsConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Upload limits
    pub max_image_size_bytes: usize,
    pub max_archive_size_bytes: usize,
    // Import pipeline
    pub import_chunk_size_bytes: usize,
    pub import_temp_dir: Option<PathBuf>,
    pub image_extensions: Vec<String>,
    pub owner_types: Vec<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<AlbumsConfig>);

impl Config {
    fn inner(&self) -> &AlbumsConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.inner().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = AlbumsConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner()
            .storage_backend
            .unwrap_or(StorageBackend::Local)
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    /// S3 region, falling back to `AWS_REGION`
    pub fn s3_region(&self) -> Option<&str> {
        self.inner()
            .s3_region
            .as_deref()
            .or(self.inner().aws_region.as_deref())
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn max_image_size_bytes(&self) -> usize {
        self.inner().max_image_size_bytes
    }

    pub fn max_archive_size_bytes(&self) -> usize {
        self.inner().max_archive_size_bytes
    }

    pub fn import_chunk_size_bytes(&self) -> usize {
        self.inner().import_chunk_size_bytes
    }

    /// Directory for extracted entries when the backend cannot rename
    pub fn import_temp_dir(&self) -> PathBuf {
        self.inner()
            .import_temp_dir
            .clone()
            .unwrap_or_else(env::temp_dir)
    }

    pub fn image_extensions(&self) -> &[String] {
        &self.inner().image_extensions
    }

    pub fn owner_types(&self) -> &[String] {
        &self.inner().owner_types
    }

    /// Whether albums may be attached to records of this kind
    pub fn allows_owner_type(&self, owner_type: &str) -> bool {
        self.inner()
            .owner_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(owner_type))
    }
}

fn is_production_env(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AlbumsConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => Some(raw.parse::<StorageBackend>()?),
            Err(_) => None,
        };

        let max_image_size_mb = env::var("MAX_IMAGE_SIZE_MB")
            .unwrap_or_else(|_| MAX_IMAGE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_IMAGE_SIZE_MB);

        let max_archive_size_mb = env::var("MAX_ARCHIVE_SIZE_MB")
            .unwrap_or_else(|_| MAX_ARCHIVE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_ARCHIVE_SIZE_MB);

        let chunk_size_kb = env::var("IMPORT_CHUNK_SIZE_KB")
            .unwrap_or_else(|_| IMPORT_CHUNK_SIZE_KB.to_string())
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("IMPORT_CHUNK_SIZE_KB must be a valid number"))?;

        let image_extensions = env::var("ALBUM_IMAGE_EXTENSIONS")
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|_| {
                DEFAULT_IMAGE_EXTENSIONS
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect()
            });

        let owner_types = env::var("ALBUM_OWNER_TYPES")
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|_| vec!["user".to_string()]);

        Ok(AlbumsConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            max_image_size_bytes: max_image_size_mb * 1024 * 1024,
            max_archive_size_bytes: max_archive_size_mb * 1024 * 1024,
            import_chunk_size_bytes: chunk_size_kb * 1024,
            import_temp_dir: env::var("IMPORT_TEMP_DIR").ok().map(PathBuf::from),
            image_extensions,
            owner_types,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.import_chunk_size_bytes < MIN_CHUNK_SIZE {
            return Err(anyhow::anyhow!(
                "IMPORT_CHUNK_SIZE_KB must be at least {}",
                MIN_CHUNK_SIZE / 1024
            ));
        }

        if self.image_extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "ALBUM_IMAGE_EXTENSIONS must list at least one extension"
            ));
        }

        if self.owner_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALBUM_OWNER_TYPES must list at least one owner type"
            ));
        }

        match self.storage_backend.unwrap_or(StorageBackend::Local) {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AlbumsConfig {
        AlbumsConfig {
            base: BaseConfig {
                server_port: 4000,
                cors_origins: vec!["*".to_string()],
                db_max_connections: MAX_CONNECTIONS,
                db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
                environment: "development".to_string(),
            },
            database_url: "postgresql://localhost/albums".to_string(),
            storage_backend: Some(StorageBackend::Local),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: Some("/tmp/albums".to_string()),
            local_storage_base_url: Some("http://localhost:4000/media".to_string()),
            max_image_size_bytes: MAX_IMAGE_SIZE_MB * 1024 * 1024,
            max_archive_size_bytes: MAX_ARCHIVE_SIZE_MB * 1024 * 1024,
            import_chunk_size_bytes: MIN_CHUNK_SIZE,
            import_temp_dir: None,
            image_extensions: vec!["jpg".to_string(), "png".to_string()],
            owner_types: vec!["user".to_string()],
        }
    }

    #[test]
    fn test_valid_local_config() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_chunk_size_below_minimum_rejected() {
        let mut config = sample();
        config.import_chunk_size_bytes = 32 * 1024;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("IMPORT_CHUNK_SIZE_KB"));
    }

    #[test]
    fn test_s3_requires_bucket_and_region() {
        let mut config = sample();
        config.storage_backend = Some(StorageBackend::S3);
        assert!(config.validate().is_err());

        config.s3_bucket = Some("albums".to_string());
        assert!(config.validate().is_err());

        config.aws_region = Some("eu-west-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_owner_type_lookup_ignores_case() {
        let config = Config(Box::new(sample()));
        assert!(config.allows_owner_type("User"));
        assert!(!config.allows_owner_type("event"));
    }

    #[test]
    fn test_split_list_normalizes_entries() {
        assert_eq!(split_list(" JPG, png ,,gif"), vec!["jpg", "png", "gif"]);
    }
}
