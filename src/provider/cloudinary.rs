//! Cloudinary upload client
//!
//! Implements [`MediaProvider`] over the Cloudinary REST upload API.
//!
//! Each upload is one signed multipart POST to
//! `{endpoint}/v1_1/{cloud_name}/{resource_type}/upload`. The signature is a
//! hex SHA-256 over the sorted request parameters with the API secret
//! appended; `file`, `api_key` and the signature itself are excluded from the
//! signed string.
//!
//! # Example
//!
//! ```no_run
//! use media_upload_gateway::provider::{CloudinaryClient, MediaProvider, ProviderCredentials};
//! use media_upload_gateway::upload::{MediaKind, Transformation, UploadDestination, UploadRequest};
//! use bytes::Bytes;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = ProviderCredentials::new("demo", "api-key", "api-secret");
//! let client = CloudinaryClient::new(credentials)?;
//!
//! let request = UploadRequest::new("photo.jpg", Bytes::from("jpeg bytes"));
//! let destination = UploadDestination {
//!     folder: "test_upload".into(),
//!     kind: MediaKind::Image,
//!     transformation: Some(Transformation::default()),
//! };
//!
//! let uploaded = client.upload(&request, &destination).await?;
//! println!("Delivered at {}", uploaded.secure_url);
//! # Ok(())
//! # }
//! ```

use super::{MediaProvider, ProviderCredentials, ProviderError, ProviderUpload};
use crate::config::ProviderConfig;
use crate::upload::{UploadDestination, UploadRequest};
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Production Cloudinary API base URL
pub const DEFAULT_ENDPOINT: &str = "https://api.cloudinary.com";

/// Cloudinary upload client.
///
/// Holds the account credentials and a shared reqwest client; carries no
/// per-upload state, so one instance serves all concurrent requests.
pub struct CloudinaryClient {
    credentials: ProviderCredentials,
    endpoint: String,
    http_client: reqwest::Client,
}

/// Successful upload response body (fields the gateway cares about)
#[derive(Debug, Deserialize)]
struct UploadResponseBody {
    secure_url: String,
}

/// Error response body, `{"error": {"message": "..."}}`
#[derive(Debug, Deserialize)]
struct ErrorResponseBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryClient {
    /// Create a client against the production endpoint
    pub fn new(credentials: ProviderCredentials) -> Result<Self, ProviderError> {
        Self::with_endpoint(credentials, DEFAULT_ENDPOINT)
    }

    /// Create a client against a custom endpoint (mock servers in tests)
    pub fn with_endpoint(
        credentials: ProviderCredentials,
        endpoint: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::ConfigError(e.to_string()))?;

        Ok(Self {
            credentials,
            endpoint: endpoint.into(),
            http_client,
        })
    }

    /// Build a client from the provider section of the configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let credentials = ProviderCredentials::from_config(config);
        match &config.endpoint {
            Some(endpoint) => Self::with_endpoint(credentials, endpoint.clone()),
            None => Self::new(credentials),
        }
    }

    /// Upload URL for a resource type ("image" or "video")
    pub fn upload_url(&self, resource_type: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/upload",
            self.endpoint.trim_end_matches('/'),
            self.credentials.cloud_name(),
            resource_type
        )
    }

    /// Sign request parameters.
    ///
    /// Pairs are sorted by key, joined as `key=value` with `&`, the API
    /// secret is appended and the whole string SHA-256 hashed to hex.
    fn sign(params: &[(&str, String)], api_secret: &str) -> String {
        let mut pairs: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        pairs.sort();

        let mut to_sign = pairs.join("&");
        to_sign.push_str(api_secret);

        hex::encode(Sha256::digest(to_sign.as_bytes()))
    }
}

#[async_trait]
impl MediaProvider for CloudinaryClient {
    #[tracing::instrument(
        name = "provider.upload",
        skip(self, request, destination),
        fields(
            provider.folder = %destination.folder,
            provider.resource_type = %destination.kind.resource_type(),
            upload.file_name = %request.file_name,
            upload.bytes = request.body.len(),
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    async fn upload(
        &self,
        request: &UploadRequest,
        destination: &UploadDestination,
    ) -> Result<ProviderUpload, ProviderError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();

        // Parameters covered by the signature: everything except the file
        // bytes, the api_key and the signature itself.
        let mut signed_params: Vec<(&str, String)> = vec![
            ("folder", destination.folder.clone()),
            ("timestamp", timestamp.clone()),
        ];
        if let Some(transformation) = &destination.transformation {
            signed_params.push(("transformation", transformation.to_param()));
        }
        let signature = Self::sign(&signed_params, self.credentials.api_secret());

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(request.body.to_vec())
                    .file_name(request.file_name.clone()),
            )
            .text("api_key", self.credentials.api_key().to_string())
            .text("timestamp", timestamp)
            .text("folder", destination.folder.clone())
            .text("signature", signature);
        if let Some(transformation) = &destination.transformation {
            form = form.text("transformation", transformation.to_param());
        }

        let response = self
            .http_client
            .post(self.upload_url(destination.kind.resource_type()))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::TransportFailure(e.to_string()))?;

        let status = response.status();
        tracing::Span::current().record("http.status_code", status.as_u16());

        if status.is_success() {
            let body: UploadResponseBody = response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

            tracing::info!(
                secure_url = %body.secure_url,
                "Provider upload completed"
            );

            Ok(ProviderUpload {
                secure_url: body.secure_url,
            })
        } else {
            let message = response
                .json::<ErrorResponseBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_default();

            Err(ProviderError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::Transformation;

    fn test_client() -> CloudinaryClient {
        let credentials = ProviderCredentials::new("demo", "key", "secret");
        CloudinaryClient::new(credentials).unwrap()
    }

    #[test]
    fn test_default_upload_url() {
        let client = test_client();
        assert_eq!(
            client.upload_url("image"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        assert_eq!(
            client.upload_url("video"),
            "https://api.cloudinary.com/v1_1/demo/video/upload"
        );
    }

    #[test]
    fn test_custom_endpoint_trailing_slash() {
        let credentials = ProviderCredentials::new("demo", "key", "secret");
        let client =
            CloudinaryClient::with_endpoint(credentials, "http://localhost:9000/").unwrap();
        assert_eq!(
            client.upload_url("image"),
            "http://localhost:9000/v1_1/demo/image/upload"
        );
    }

    #[test]
    fn test_signature_is_deterministic() {
        let params = vec![
            ("timestamp", "1700000000".to_string()),
            ("folder", "test_upload".to_string()),
        ];

        let first = CloudinaryClient::sign(&params, "secret");
        let second = CloudinaryClient::sign(&params, "secret");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64); // hex SHA-256
    }

    #[test]
    fn test_signature_sorts_params() {
        // Same params in different order must sign identically
        let forward = vec![
            ("folder", "test_upload".to_string()),
            ("timestamp", "1700000000".to_string()),
            (
                "transformation",
                Transformation::default().to_param(),
            ),
        ];
        let reversed: Vec<(&str, String)> = forward.iter().rev().cloned().collect();

        assert_eq!(
            CloudinaryClient::sign(&forward, "secret"),
            CloudinaryClient::sign(&reversed, "secret")
        );
    }

    #[test]
    fn test_signature_known_value() {
        let params = vec![
            ("folder", "test_upload".to_string()),
            ("timestamp", "1700000000".to_string()),
        ];

        let expected = hex::encode(Sha256::digest(
            b"folder=test_upload&timestamp=1700000000secret",
        ));
        assert_eq!(CloudinaryClient::sign(&params, "secret"), expected);
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let params = vec![("timestamp", "1700000000".to_string())];
        assert_ne!(
            CloudinaryClient::sign(&params, "secret-a"),
            CloudinaryClient::sign(&params, "secret-b")
        );
    }

    #[test]
    fn test_from_config_uses_endpoint_override() {
        let config = ProviderConfig {
            cloud_name: "demo".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            endpoint: Some("http://localhost:9000".into()),
        };

        let client = CloudinaryClient::from_config(&config).unwrap();
        assert_eq!(
            client.upload_url("image"),
            "http://localhost:9000/v1_1/demo/image/upload"
        );
    }
}
