//! Upload module
//!
//! Core types for the upload-and-respond contract: the per-request payload,
//! the provider destination (folder, resource type, optional transformation)
//! and the normalized outcome returned to HTTP clients.

use bytes::Bytes;

pub mod gateway;
pub mod multipart;

pub use gateway::UploadGateway;

/// Media kinds accepted by the gateway.
///
/// The two kinds share one upload path; they differ only in destination
/// folder, provider resource type and whether a transformation is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Provider resource type segment in the upload URL
    pub fn resource_type(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Message returned to the client on a successful upload
    pub fn success_message(&self) -> &'static str {
        match self {
            MediaKind::Image => "Upload successful",
            MediaKind::Video => "Video uploaded successfully",
        }
    }

    /// Diagnostic returned when the file field is absent or empty
    pub fn missing_file_message(&self) -> &'static str {
        match self {
            MediaKind::Image => "No file uploaded",
            MediaKind::Video => "No video uploaded",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.resource_type())
    }
}

/// Fixed transformation attached to image uploads.
///
/// These are pass-through parameters for the provider, never applied locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformation {
    pub width: u32,
    pub height: u32,
    pub crop: &'static str,
}

impl Default for Transformation {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            crop: "limit",
        }
    }
}

impl Transformation {
    /// Render as a provider transformation string, e.g. `c_limit,h_800,w_800`
    pub fn to_param(&self) -> String {
        format!("c_{},h_{},w_{}", self.crop, self.height, self.width)
    }
}

/// One inbound file, extracted from the multipart request body.
///
/// Created per HTTP call and dropped when the call completes.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub body: Bytes,
}

impl UploadRequest {
    pub fn new(file_name: impl Into<String>, body: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            body,
        }
    }

    /// True when the upload carries no bytes and must be rejected locally
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Where and how the provider should store an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDestination {
    pub folder: String,
    pub kind: MediaKind,
    pub transformation: Option<Transformation>,
}

/// Normalized result of one upload operation, ready for HTTP mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success { message: String, url: String },
    Failure { status: u16, message: String },
}

impl UploadOutcome {
    /// HTTP status code for this outcome
    pub fn http_status(&self) -> u16 {
        match self {
            UploadOutcome::Success { .. } => 200,
            UploadOutcome::Failure { status, .. } => *status,
        }
    }
}
