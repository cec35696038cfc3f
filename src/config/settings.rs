//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file read by [`Settings::load`] unless `EDGE_CONFIG` points elsewhere
pub const DEFAULT_CONFIG_PATH: &str = "config/functions.yaml";

/// Conventional provider variable names, applied on top of every other source
const ENV_ALIASES: &[(&str, &str)] = &[
    ("database.url", "SUPABASE_URL"),
    ("database.service_role_key", "SUPABASE_SERVICE_ROLE_KEY"),
    ("email.api_key", "RESEND_API_KEY"),
    ("email.from", "EMAIL_FROM"),
    ("fleet.provider_id", "FLEET_ENGINE_PROVIDER_ID"),
    ("fleet.client_email", "GOOGLE_SERVICE_ACCOUNT_EMAIL"),
    ("fleet.private_key", "GOOGLE_PRIVATE_KEY"),
    ("app.login_url", "APP_LOGIN_URL"),
];

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub email: EmailSettings,
    #[serde(default)]
    pub fleet: FleetSettings,
    #[serde(default)]
    pub app: AppSettings,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Managed database / auth backend (PostgREST + auth admin API)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub service_role_key: String,
    pub timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_role_key: String::new(),
            timeout_ms: default_timeout(),
        }
    }
}

/// Transactional email API
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailSettings {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    pub timeout_ms: u64,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.resend.com".to_string(),
            api_key: String::new(),
            from: "Cargo Tracking <noreply@cargotracking.app>".to_string(),
            timeout_ms: default_timeout(),
        }
    }
}

/// Fleet Engine (Deliveries API) and its service account
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FleetSettings {
    pub api_url: String,
    pub provider_id: String,
    pub client_email: String,
    /// PEM encoded service-account key. Escaped `\n` sequences are accepted.
    pub private_key: String,
    pub token_uri: String,
    pub scope: String,
    pub timeout_ms: u64,
}

impl Default for FleetSettings {
    fn default() -> Self {
        Self {
            api_url: "https://fleetengine.googleapis.com".to_string(),
            provider_id: String::new(),
            client_email: String::new(),
            private_key: String::new(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            scope: "https://www.googleapis.com/auth/cloud-platform".to_string(),
            timeout_ms: default_timeout(),
        }
    }
}

impl FleetSettings {
    /// Whether enough is configured to mint access tokens and address a provider
    pub fn is_configured(&self) -> bool {
        !self.provider_id.is_empty() && !self.client_email.is_empty() && !self.private_key.is_empty()
    }

    /// The private key with escaped newlines restored
    pub fn private_key_pem(&self) -> String {
        self.private_key.replace("\\n", "\n")
    }
}

/// Values rendered into emails
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub login_url: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "Cargo Tracking".to_string(),
            login_url: "https://app.cargotracking.app/login".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_timeout() -> u64 {
    15000
}

impl Settings {
    /// Load settings from the default config file and the environment
    pub fn load() -> Result<Self> {
        let path = std::env::var("EDGE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load settings from a specific configuration file plus the environment.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let format = if path.extension().map_or(false, |ext| ext == "yaml" || ext == "yml") {
            FileFormat::Yaml
        } else {
            FileFormat::Toml
        };

        let mut config_builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?;

        if path.exists() {
            config_builder = config_builder.add_source(File::from(path).format(format));
        }

        config_builder = config_builder.add_source(
            Environment::with_prefix("EDGE")
                .separator("__")
                .try_parsing(true),
        );

        for (key, var) in ENV_ALIASES {
            config_builder = config_builder.set_override_option(*key, std::env::var(var).ok())?;
        }

        let settings: Settings = config_builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }
        if self.database.url.is_empty() {
            return Err(invalid("database.url (SUPABASE_URL) is required"));
        }
        if self.database.service_role_key.is_empty() {
            return Err(invalid(
                "database.service_role_key (SUPABASE_SERVICE_ROLE_KEY) is required",
            ));
        }
        if self.email.api_key.is_empty() {
            return Err(invalid("email.api_key (RESEND_API_KEY) is required"));
        }
        if self.email.from.is_empty() {
            return Err(invalid("email.from cannot be empty"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            database: DatabaseSettings::default(),
            email: EmailSettings::default(),
            fleet: FleetSettings::default(),
            app: AppSettings::default(),
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
        }
    }
}
