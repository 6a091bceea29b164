use anyhow::{Context, Result};
use serde::Deserialize;

/// Server configuration. Every field is defaulted so an empty or missing
/// file yields a working dev setup.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Public base URL, referenced in invitation email bodies.
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: "0.0.0.0:8080".into(),
            public_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            url: "sqlite://data/lanyard.db".into(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            jwt_secret: "change-me-in-production".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for diploma templates and other stored files.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            path: "data/storage".into(),
        }
    }
}

/// SMTP relay settings. With no server configured, outbound mail is logged
/// instead of delivered.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MailConfig {
    pub smtp_server: Option<String>,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Config> {
        let config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("invalid config file {path}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("config file {path} not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(e).with_context(|| format!("could not read config file {path}")),
        };
        Ok(config)
    }
}
