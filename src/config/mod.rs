//! Configuration module for the upload gateway
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation of the provider credentials.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
///
/// # Examples
///
/// ```ignore
/// std::env::set_var("MY_VAR", "value");
/// let result = expand_env_vars("prefix-${MY_VAR}-suffix");
/// assert_eq!(result, "prefix-value-suffix");
///
/// let result = expand_env_vars("${MISSING:-default}");
/// assert_eq!(result, "default");
/// ```
fn expand_env_vars(s: &str) -> String {
    // Regex to capture ${VAR} or ${VAR:-default}
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}").unwrap();
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let full_match = cap.get(0).unwrap();
        let var_name = cap.get(1).unwrap().as_str();

        // Append the text before the match
        result.push_str(&s[last_match..full_match.start()]);

        // Get value from env, or use default from regex
        let value = match std::env::var(var_name) {
            Ok(val) => val,
            Err(_) => {
                if let Some(default) = cap.get(2) {
                    default.as_str().to_string()
                } else {
                    // No env var and no default. Keep the original placeholder.
                    full_match.as_str().to_string()
                }
            }
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    // Append the rest of the string after the last match
    result.push_str(&s[last_match..]);

    result
}

/// Custom deserializer for strings with environment variable expansion.
///
/// This is used with serde's `deserialize_with` attribute to automatically
/// expand environment variables when deserializing configuration values.
fn deserialize_with_env<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(expand_env_vars(&s))
}

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.cloud_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Provider cloud_name must not be empty".into(),
            ));
        }

        if self.provider.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Provider api_key must not be empty".into(),
            ));
        }

        if self.provider.api_secret.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Provider api_secret must not be empty".into(),
            ));
        }

        if let Some(ref endpoint) = self.provider.endpoint {
            if !is_valid_http_url(endpoint) {
                return Err(ConfigError::ValidationError(
                    "Invalid provider endpoint: must start with http:// or https://".into(),
                ));
            }
        }

        if self.upload.image_folder.trim().is_empty() || self.upload.video_folder.trim().is_empty()
        {
            return Err(ConfigError::ValidationError(
                "Upload folders must not be empty".into(),
            ));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "max_upload_bytes must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub address: String,
    /// Upper bound on the inbound multipart body. Requests over this limit
    /// are rejected with 413 before reaching the provider.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    104857600 // 100MB
}

/// Media provider credentials and endpoint configuration.
///
/// The three secrets support `${VAR}` and `${VAR:-default}` expansion so that
/// config files can be committed without embedding credentials:
///
/// ```yaml
/// provider:
///   cloud_name: "${CLOUDINARY_CLOUD_NAME}"
///   api_key: "${CLOUDINARY_API_KEY}"
///   api_secret: "${CLOUDINARY_API_SECRET}"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(deserialize_with = "deserialize_with_env")]
    pub cloud_name: String,
    #[serde(deserialize_with = "deserialize_with_env")]
    pub api_key: String,
    #[serde(deserialize_with = "deserialize_with_env")]
    pub api_secret: String,
    /// Override the provider API base URL. Mainly useful for tests pointing
    /// at a local mock server. Default: the provider's production endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Upload destination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_image_folder")]
    pub image_folder: String,
    #[serde(default = "default_video_folder")]
    pub video_folder: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            image_folder: default_image_folder(),
            video_folder: default_video_folder(),
        }
    }
}

fn default_image_folder() -> String {
    "test_upload".to_string()
}

fn default_video_folder() -> String {
    "test_upload_video".to_string()
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                address: "127.0.0.1:8080".into(),
                max_upload_bytes: default_max_upload_bytes(),
            },
            provider: ProviderConfig {
                cloud_name: "demo".into(),
                api_key: "key".into(),
                api_secret: "secret".into(),
                endpoint: None,
            },
            upload: UploadConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }

    #[test]
    fn test_default_upload_folders() {
        let upload = UploadConfig::default();
        assert_eq!(upload.image_folder, "test_upload");
        assert_eq!(upload.video_folder, "test_upload_video");
    }

    #[test]
    fn test_config_validation_ok() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_cloud_name() {
        let mut config = test_config();
        config.provider.cloud_name = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_missing_secret() {
        let mut config = test_config();
        config.provider.api_secret = "".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_endpoint() {
        let mut config = test_config();
        config.provider.endpoint = Some("ftp://example.com".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_body_limit() {
        let mut config = test_config();
        config.server.max_upload_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_env_var_with_default() {
        let result = expand_env_vars("${DEFINITELY_NOT_SET_ABC:-fallback}");
        assert_eq!(result, "fallback");
    }

    #[test]
    fn test_expand_env_var_missing_keeps_placeholder() {
        let result = expand_env_vars("${DEFINITELY_NOT_SET_ABC}");
        assert_eq!(result, "${DEFINITELY_NOT_SET_ABC}");
    }
}
