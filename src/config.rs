//! Configuration management for the Air Quality Meter skill
//!
//! Handles loading configuration from files and environment variables,
//! and validates every setting before the server starts.

use crate::SkillError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "AIR_QUALITY_CONFIG";

/// Root configuration structure for the skill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillConfig {
    /// Air quality provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Voice platform settings
    #[serde(default)]
    pub skill: PlatformConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Air quality provider configuration settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Endpoint the query string is appended to
    #[serde(default = "default_provider_endpoint")]
    pub endpoint: String,
    /// Field selector sent as `fields=`
    #[serde(default = "default_provider_field")]
    pub field: String,
    /// Static provider credential sent as `key=`
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds; unset means wait for the provider
    #[serde(default)]
    pub timeout_seconds: Option<u32>,
}

// The key must never show up in `{:?}` output.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("endpoint", &self.endpoint)
            .field("field", &self.field)
            .field("api_key", &"<redacted>")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Voice platform configuration settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Application id requests must carry; unset accepts any application
    #[serde(default)]
    pub application_id: Option<String>,
}

/// HTTP server configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_server_host")]
    pub host: String,
    /// Port to bind
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_provider_endpoint() -> String {
    "http://api.breezometer.com/baqi/".to_string()
}

fn default_provider_field() -> String {
    "breezometer_description".to_string()
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_provider_endpoint(),
            field: default_provider_field(),
            api_key: String::new(),
            timeout_seconds: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            skill: PlatformConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SkillConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_from_path(explicit)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            tracing::debug!("Loading configuration from {}", config_file.display());
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // AIR_QUALITY_PROVIDER__API_KEY -> provider.api_key
        builder = builder.add_source(
            Environment::with_prefix("AIR_QUALITY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: SkillConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("air-quality-meter").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.provider.endpoint.is_empty() {
            self.provider.endpoint = default_provider_endpoint();
        }
        if self.provider.field.is_empty() {
            self.provider.field = default_provider_field();
        }
        if self.provider.timeout_seconds == Some(0) {
            self.provider.timeout_seconds = None;
        }
        if self
            .skill
            .application_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            self.skill.application_id = None;
        }
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.max_body_bytes == 0 {
            self.server.max_body_bytes = default_max_body_bytes();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate the provider credential
    pub fn validate_api_key(&self) -> Result<()> {
        let api_key = &self.provider.api_key;
        if api_key.is_empty() {
            return Err(SkillError::config(
                "Provider API key is required. Set provider.api_key or AIR_QUALITY_PROVIDER__API_KEY.",
            )
            .into());
        }

        if api_key.len() < 8 {
            return Err(SkillError::config(
                "Provider API key appears to be invalid (too short). Please check your API key.",
            )
            .into());
        }

        if api_key.len() > 100 {
            return Err(SkillError::config(
                "Provider API key appears to be invalid (too long). Please check your API key.",
            )
            .into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.provider.timeout_seconds.is_some_and(|t| t > 300) {
            return Err(SkillError::config("Provider timeout cannot exceed 300 seconds").into());
        }

        if self.server.port == 0 {
            return Err(SkillError::config("Server port cannot be 0").into());
        }

        if self.server.max_body_bytes > 1024 * 1024 {
            return Err(SkillError::config("Request body limit cannot exceed 1 MiB").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SkillError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SkillError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.provider.endpoint.starts_with("http://")
            && !self.provider.endpoint.starts_with("https://")
        {
            return Err(SkillError::config(
                "Provider endpoint must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if self.provider.field.trim().is_empty() {
            return Err(SkillError::config("Provider field selector cannot be blank").into());
        }

        Ok(())
    }

    /// Socket address string the server binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, MutexGuard};

    // Environment overrides are process-wide; loading tests take turns.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn valid_config() -> SkillConfig {
        let mut config = SkillConfig::default();
        config.provider.api_key = "valid_api_key_123".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = SkillConfig::default();
        assert_eq!(config.provider.endpoint, "http://api.breezometer.com/baqi/");
        assert_eq!(config.provider.field, "breezometer_description");
        assert!(config.provider.timeout_seconds.is_none());
        assert!(config.skill.application_id.is_none());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_validation_missing_api_key() {
        let config = SkillConfig::default();
        let result = config.validate_api_key();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key is required"));
    }

    #[test]
    fn test_config_validation_short_api_key() {
        let mut config = SkillConfig::default();
        config.provider.api_key = "short".to_string();
        assert!(config.validate_api_key().is_err());
    }

    #[test]
    fn test_config_validation_valid_api_key() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = valid_config();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = valid_config();
        config.provider.timeout_seconds = Some(500);
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_endpoint_scheme() {
        let mut config = valid_config();
        config.provider.endpoint = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_fills_blanks() {
        let mut config = valid_config();
        config.provider.endpoint.clear();
        config.provider.timeout_seconds = Some(0);
        config.skill.application_id = Some("  ".to_string());
        config.logging.format.clear();
        config.apply_defaults();
        assert_eq!(config.provider.endpoint, default_provider_endpoint());
        assert!(config.provider.timeout_seconds.is_none());
        assert!(config.skill.application_id.is_none());
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_debug_output_redacts_api_key() {
        let config = valid_config();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("valid_api_key_123"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let _guard = env_lock();
        let path = std::env::temp_dir().join(format!(
            "air-quality-meter-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[provider]\napi_key = \"file_api_key_123\"\ntimeout_seconds = 10\n\n[server]\nport = 8081\n",
        )
        .unwrap();

        let config = SkillConfig::load_from_path(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.provider.api_key, "file_api_key_123");
        assert_eq!(config.provider.timeout_seconds, Some(10));
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.provider.field, "breezometer_description");
    }

    #[test]
    fn test_environment_overrides_missing_file() {
        let _guard = env_lock();
        let path = env::temp_dir().join(format!(
            "air-quality-meter-missing-{}.toml",
            std::process::id()
        ));
        unsafe {
            env::set_var("AIR_QUALITY_PROVIDER__API_KEY", "env_api_key_123");
            env::set_var("AIR_QUALITY_SERVER__PORT", "9090");
        }

        let result = SkillConfig::load_from_path(Some(path));

        unsafe {
            env::remove_var("AIR_QUALITY_PROVIDER__API_KEY");
            env::remove_var("AIR_QUALITY_SERVER__PORT");
        }

        let config = result.unwrap();
        assert_eq!(config.provider.api_key, "env_api_key_123");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.provider.endpoint, default_provider_endpoint());
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = SkillConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("air-quality-meter"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
