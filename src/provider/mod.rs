//! Media provider module
//!
//! The gateway treats the media host as a black-box capability: hand it a
//! file plus a destination, get back a secure URL or an error. The
//! [`MediaProvider`] trait is that seam; [`CloudinaryClient`] is the one
//! production implementation.

use crate::config::ProviderConfig;
use crate::upload::{UploadDestination, UploadRequest};
use async_trait::async_trait;
use thiserror::Error;

pub mod cloudinary;

pub use cloudinary::CloudinaryClient;

/// Provider call errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The provider answered but refused the upload
    #[error("Provider rejected upload (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The network call itself failed (connect error, timeout, reset)
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// The provider answered with a body the client could not interpret
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// HTTP status the gateway surfaces for this error.
    ///
    /// Provider-reported rejections are server errors; failures to reach or
    /// understand the provider are bad-gateway conditions.
    pub fn http_status(&self) -> u16 {
        match self {
            ProviderError::ConfigError(_) => 500,
            ProviderError::Rejected { .. } => 500,
            ProviderError::TransportFailure(_) => 502,
            ProviderError::InvalidResponse(_) => 502,
        }
    }

    /// Label for the error metrics counter
    pub fn metric_label(&self) -> &'static str {
        match self {
            ProviderError::ConfigError(_) => "provider_config",
            ProviderError::Rejected { .. } => "provider_rejected",
            ProviderError::TransportFailure(_) => "provider_transport",
            ProviderError::InvalidResponse(_) => "provider_response",
        }
    }
}

/// Successful provider upload
#[derive(Debug, Clone)]
pub struct ProviderUpload {
    /// Provider-assigned HTTPS delivery URL
    pub secure_url: String,
}

/// External media-hosting capability.
///
/// Implementations must be stateless with respect to individual uploads so a
/// single instance can be shared across concurrent requests behind an `Arc`.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Upload one file to the given destination
    async fn upload(
        &self,
        request: &UploadRequest,
        destination: &UploadDestination,
    ) -> Result<ProviderUpload, ProviderError>;
}

/// Credential loading errors
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

/// Provider account credentials.
///
/// Constructed once at process startup and immutable afterwards; no mutation
/// methods are exposed.
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl ProviderCredentials {
    /// Create new credentials
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Build credentials from the provider section of the configuration
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(
            config.cloud_name.clone(),
            config.api_key.clone(),
            config.api_secret.clone(),
        )
    }

    /// Load credentials from environment variables
    ///
    /// Looks for:
    /// - `CLOUDINARY_CLOUD_NAME`
    /// - `CLOUDINARY_API_KEY`
    /// - `CLOUDINARY_API_SECRET`
    pub fn from_env() -> Result<Self, CredentialsError> {
        let cloud_name = std::env::var("CLOUDINARY_CLOUD_NAME").map_err(|_| {
            CredentialsError::MissingCredentials("CLOUDINARY_CLOUD_NAME not set".into())
        })?;

        let api_key = std::env::var("CLOUDINARY_API_KEY").map_err(|_| {
            CredentialsError::MissingCredentials("CLOUDINARY_API_KEY not set".into())
        })?;

        let api_secret = std::env::var("CLOUDINARY_API_SECRET").map_err(|_| {
            CredentialsError::MissingCredentials("CLOUDINARY_API_SECRET not set".into())
        })?;

        Ok(Self::new(cloud_name, api_key, api_secret))
    }

    /// Get the cloud (account) name
    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the API secret
    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }
}
