//! # configs
//!
//! Layered configuration for the boulder catalogue.
//!
//! Sources, later ones winning:
//!
//! | Source                     | Example                                  |
//! |----------------------------|------------------------------------------|
//! | built-in defaults          | `server.port = 8080`                     |
//! | `config/catalog.toml`      | `[media] root = "/srv/boulders"`         |
//! | `CATALOG__*` environment   | `CATALOG__DATABASE__URL=sqlite:prod.db`  |
//!
//! A `.env` file in the working directory is read first.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, Map};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Sector new boulders are filed under unless configured otherwise.
pub const DEFAULT_SECTOR_ID: &str = "5f08920b-ff8b-45ed-b3f8-a4976bdd71b7";

const DEFAULT_CONFIG_FILE: &str = "config/catalog.toml";
const ENV_PREFIX: &str = "CATALOG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub convert: ConvertConfig,
    pub forms: FormsConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite:boulders.db`.
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded photos are written to.
    pub root: PathBuf,
    /// URL path the directory is served under.
    pub url_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub default_sector_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadConfig {
    /// Remote upload endpoint. When unset, photos are stored in-process.
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConvertConfig {
    /// External HEIF converter, e.g. `heif-convert`.
    pub heif_command: Option<PathBuf>,
}

/// Bounds on open create/edit forms.
#[derive(Debug, Clone, Deserialize)]
pub struct FormsConfig {
    /// Seconds an unsubmitted form is kept.
    pub ttl_secs: u64,
    pub max_open: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
    pub json: bool,
}

impl AppConfig {
    /// Loads `.env`, the default config file (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_sources(Some(Path::new(DEFAULT_CONFIG_FILE)), None)
    }

    /// `env` replaces the process environment when given.
    pub fn from_sources(
        file: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite:boulders.db")?
            .set_default("media.root", "./data/uploads")?
            .set_default("media.url_prefix", "/media")?
            .set_default("catalog.default_sector_id", DEFAULT_SECTOR_ID)?
            .set_default("forms.ttl_secs", 3600)?
            .set_default("forms.max_open", 256)?
            .set_default("log.filter", "boulder_catalog=info,services=info,api_adapters=info,tower_http=info")?
            .set_default("log.json", false)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> Option<Map<String, String>> {
        Some(Map::new())
    }

    #[test]
    fn defaults_are_complete() {
        let config = AppConfig::from_sources(None, no_env()).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.media.url_prefix, "/media");
        assert_eq!(
            config.catalog.default_sector_id,
            Uuid::parse_str(DEFAULT_SECTOR_ID).unwrap()
        );
        assert!(config.upload.endpoint.is_none());
        assert!(config.convert.heif_command.is_none());
        assert!(!config.log.json);
        assert_eq!(config.forms.ttl_secs, 3600);
        assert_eq!(config.forms.max_open, 256);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9090\n\n[convert]\nheif_command = \"heif-convert\"\n",
        )
        .unwrap();

        let config = AppConfig::from_sources(Some(&path), no_env()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.convert.heif_command, Some(PathBuf::from("heif-convert")));
    }

    #[test]
    fn environment_overrides_everything() {
        let mut env = Map::new();
        env.insert("CATALOG__SERVER__PORT".to_string(), "7000".to_string());
        env.insert("CATALOG__LOG__JSON".to_string(), "true".to_string());
        env.insert("CATALOG__FORMS__MAX_OPEN".to_string(), "32".to_string());
        env.insert(
            "CATALOG__UPLOAD__ENDPOINT".to_string(),
            "https://media.example/api/boulders".to_string(),
        );

        let config = AppConfig::from_sources(None, Some(env)).unwrap();
        assert_eq!(config.server.port, 7000);
        assert!(config.log.json);
        assert_eq!(config.forms.max_open, 32);
        assert_eq!(
            config.upload.endpoint.as_deref(),
            Some("https://media.example/api/boulders")
        );
    }

    #[test]
    fn bad_sector_id_is_rejected() {
        let mut env = Map::new();
        env.insert(
            "CATALOG__CATALOG__DEFAULT_SECTOR_ID".to_string(),
            "not-a-uuid".to_string(),
        );
        assert!(AppConfig::from_sources(None, Some(env)).is_err());
    }
}
