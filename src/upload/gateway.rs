//! Upload gateway
//!
//! One generic upload operation parameterized by [`MediaKind`]: validate the
//! inbound file, hand it to the provider, map the result to an
//! [`UploadOutcome`]. The image and video endpoints differ only in the
//! destination this module derives for them.

use super::{MediaKind, Transformation, UploadDestination, UploadOutcome, UploadRequest};
use crate::config::UploadConfig;
use crate::metrics;
use crate::provider::{MediaProvider, ProviderError};
use std::sync::Arc;
use std::time::Instant;

/// Upload gateway shared by every request.
///
/// Holds the provider handle and the per-kind destination folders; all
/// per-call state lives in the [`UploadRequest`].
pub struct UploadGateway {
    provider: Arc<dyn MediaProvider>,
    image_folder: String,
    video_folder: String,
}

impl UploadGateway {
    /// Create a gateway over a provider and the configured folders
    pub fn new(provider: Arc<dyn MediaProvider>, upload_config: &UploadConfig) -> Self {
        Self {
            provider,
            image_folder: upload_config.image_folder.clone(),
            video_folder: upload_config.video_folder.clone(),
        }
    }

    /// Destination for a media kind.
    ///
    /// Images get the fixed 800x800 "limit" transformation; videos are
    /// uploaded unmodified.
    pub fn destination(&self, kind: MediaKind) -> UploadDestination {
        match kind {
            MediaKind::Image => UploadDestination {
                folder: self.image_folder.clone(),
                kind,
                transformation: Some(Transformation::default()),
            },
            MediaKind::Video => UploadDestination {
                folder: self.video_folder.clone(),
                kind,
                transformation: None,
            },
        }
    }

    /// Handle one upload end to end.
    ///
    /// Empty uploads are rejected locally without a provider call. Provider
    /// rejections map to 500 with the provider's message; transport failures
    /// map to 502.
    #[tracing::instrument(
        name = "upload.handle",
        skip(self, request),
        fields(
            upload.id = %uuid::Uuid::new_v4(),
            upload.kind = %kind,
            upload.file_name = %request.file_name,
            upload.bytes = request.body.len(),
            upload.url = tracing::field::Empty
        )
    )]
    pub async fn handle(&self, kind: MediaKind, request: UploadRequest) -> UploadOutcome {
        if request.is_empty() {
            metrics::record_upload_rejected(kind.resource_type());

            tracing::warn!(
                file_name = %request.file_name,
                "Rejected upload with no file bytes"
            );

            return UploadOutcome::Failure {
                status: 400,
                message: kind.missing_file_message().to_string(),
            };
        }

        let bytes = request.body.len() as u64;
        let destination = self.destination(kind);
        let start_time = Instant::now();

        let result = self.provider.upload(&request, &destination).await;

        let duration = start_time.elapsed();
        metrics::record_upload_duration(kind.resource_type(), duration.as_secs_f64());

        match result {
            Ok(uploaded) => {
                metrics::record_upload_success(kind.resource_type(), bytes);

                let span = tracing::Span::current();
                span.record("upload.url", uploaded.secure_url.as_str());

                tracing::info!(
                    url = %uploaded.secure_url,
                    bytes = bytes,
                    duration_ms = duration.as_millis(),
                    "Upload completed"
                );

                UploadOutcome::Success {
                    message: kind.success_message().to_string(),
                    url: uploaded.secure_url,
                }
            }
            Err(e) => {
                metrics::record_upload_failure(kind.resource_type());
                metrics::record_error(e.metric_label());

                tracing::error!(
                    error = %e,
                    duration_ms = duration.as_millis(),
                    "Upload failed"
                );

                let message = match &e {
                    ProviderError::Rejected { message, .. } if !message.is_empty() => {
                        format!("Upload failed: {}", message)
                    }
                    ProviderError::Rejected { .. } => "Upload failed".to_string(),
                    other => format!("Upload failed: {}", other),
                };

                UploadOutcome::Failure {
                    status: e.http_status(),
                    message,
                }
            }
        }
    }
}
