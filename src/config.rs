use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_url: String,

    pub log_level: String,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data/boardarr.db".to_string(),
            log_level: "info".to_string(),
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// "development" or "production". Affects default cookie flags only,
    /// never authorization logic.
    pub environment: String,
}

impl ServerConfig {
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8260,
            cors_allowed_origins: vec![
                "http://localhost:8260".to_string(),
                "http://127.0.0.1:8260".to_string(),
            ],
            environment: "production".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the HttpOnly session cookie.
    pub cookie_name: String,

    /// Fixed session lifetime in minutes. Expiry is set at creation and is
    /// never extended by subsequent requests.
    pub ttl_minutes: i64,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false only for local development without HTTPS.
    pub cookie_secure: bool,

    /// SameSite attribute: "strict", "lax" or "none".
    pub cookie_samesite: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "boardarr_session".to_string(),
            ttl_minutes: 1440,
            cookie_secure: true,
            cookie_samesite: "lax".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `BOARDARR_CONFIG` (or `./boardarr.toml`),
    /// falling back to defaults when the file does not exist. A
    /// `BOARDARR_DATABASE_URL` environment variable overrides the file.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path =
            std::env::var("BOARDARR_CONFIG").unwrap_or_else(|_| "boardarr.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {path}"))?;
            let config: Self = toml::from_str(&raw)
                .with_context(|| format!("Failed to parse config file {path}"))?;
            info!("Loaded configuration from {path}");
            config
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var("BOARDARR_DATABASE_URL") {
            config.general.database_url = url;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_url.is_empty() {
            anyhow::bail!("general.database_url must not be empty");
        }
        if self.session.ttl_minutes <= 0 {
            anyhow::bail!("session.ttl_minutes must be positive");
        }
        match self.session.cookie_samesite.to_ascii_lowercase().as_str() {
            "strict" | "lax" | "none" => {}
            other => {
                anyhow::bail!("session.cookie_samesite must be strict, lax or none, got {other}")
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.cookie_name, "boardarr_session");
        assert_eq!(config.session.ttl_minutes, 1440);
    }

    #[test]
    fn rejects_bad_samesite() {
        let mut config = Config::default();
        config.session.cookie_samesite = "sideways".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [session]
            cookie_name = "test_session"
            ttl_minutes = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.session.cookie_name, "test_session");
        assert_eq!(config.session.ttl_minutes, 30);
        assert_eq!(config.general.log_level, "info");
    }
}
