use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

use crate::db;

/// Longest session lifetime accepted from configuration (ten years).
pub const MAX_SESSION_HOURS: u64 = 24 * 365 * 10;

#[derive(Parser, Debug)]
#[command(name = "penwell", about = "A small server-rendered blog")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub site: SiteConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: u64,
    /// Key for the session cookie signature. Usually supplied as `SECRET_KEY`.
    pub secret_key: Option<String>,
    pub bcrypt_cost: u32,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub contact_email: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "penwell_session".to_string(),
            session_hours: 720,
            secret_key: None,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Penwell".to_string(),
            contact_email: None,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok());

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("penwell.db"));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let hours = self.auth.session_hours;
        if hours == 0 || hours > MAX_SESSION_HOURS {
            anyhow::bail!(
                "auth.session_hours must be between 1 and {}, got {}",
                MAX_SESSION_HOURS,
                hours
            );
        }
        Ok(())
    }

    /// Secrets and the database location come from the environment when set.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(secret) = var("SECRET_KEY").filter(|s| !s.is_empty()) {
            self.auth.secret_key = Some(secret);
        }
        if let Some(url) = var("DATABASE_URL").filter(|s| !s.is_empty()) {
            self.database.path = Some(db::path_from_url(&url));
        }
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".penwell")
        })
    }

    pub fn db_path(&self) -> Option<&PathBuf> {
        self.database.path.as_ref()
    }
}
