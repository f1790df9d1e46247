use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::models::DeploymentConfig;

/// Plain environment variables mapped onto config keys
///
/// These are applied last, so they override files and `PENGUIN__*` vars.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PROJECT_ID", "deployment.project_id"),
    ("ENDPOINT_ID", "deployment.endpoint_id"),
    ("GOOGLE_APPLICATION_CREDENTIALS", "vertex.credentials_file"),
    ("GOOGLE_OAUTH_ACCESS_TOKEN", "vertex.access_token"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
];

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub deployment: DeploymentConfig,
    #[serde(default)]
    pub vertex: VertexSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
    /// Largest accepted request body, in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    crate::routes::DEFAULT_BODY_LIMIT
}

/// Transport settings for the prediction service
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VertexSettings {
    /// Overrides the regional API host, mainly for local stubs
    pub base_url: Option<String>,
    /// Path to a service account JSON key
    pub credentials_file: Option<String>,
    pub access_token: Option<String>,
    /// Send no `Authorization` header instead of using Application Default Credentials
    #[serde(default)]
    pub disable_auth: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "full".to_string()
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables prefixed with PENGUIN__
    /// 5. PROJECT_ID, ENDPOINT_ID and the other plain variables in `ENV_OVERRIDES`
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PENGUIN__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("PENGUIN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(settings, |key| std::env::var(key).ok())
    }

    fn from_config<F>(settings: Config, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        apply_env_overrides(settings, lookup)?.try_deserialize()
    }
}

/// Layer the plain environment variables on top of the loaded config
///
/// A variable that is set but empty still overrides, so `PROJECT_ID=` clears
/// a project id coming from a file.
fn apply_env_overrides<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    for &(var, key) in ENV_OVERRIDES {
        if let Some(value) = lookup(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
