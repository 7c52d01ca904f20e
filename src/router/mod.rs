//! Request router
//!
//! Maps inbound `(method, path)` pairs onto the gateway's small route table.
//! Upload paths are POST-only; `/health` and `/metrics` are GET-only.

use crate::upload::MediaKind;
use thiserror::Error;

/// Router errors
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("No route for path: {0}")]
    NotFound(String),

    #[error("Method not allowed on {path} (allowed: {allowed})")]
    MethodNotAllowed { path: String, allowed: &'static str },
}

/// Routes the gateway serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRoute {
    /// POST /api/upload/image
    UploadImage,
    /// POST /api/upload/video
    UploadVideo,
    /// GET /health
    Health,
    /// GET /metrics
    Metrics,
}

impl UploadRoute {
    /// Media kind for upload routes, None for service routes
    pub fn media_kind(&self) -> Option<MediaKind> {
        match self {
            UploadRoute::UploadImage => Some(MediaKind::Image),
            UploadRoute::UploadVideo => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// Request router
pub struct RequestRouter;

impl RequestRouter {
    /// Resolve an HTTP request line into a route
    pub fn route(method: &str, path: &str) -> Result<UploadRoute, RouterError> {
        let (route, allowed) = match path {
            "/api/upload/image" => (UploadRoute::UploadImage, "POST"),
            "/api/upload/video" => (UploadRoute::UploadVideo, "POST"),
            "/health" => (UploadRoute::Health, "GET"),
            "/metrics" => (UploadRoute::Metrics, "GET"),
            _ => return Err(RouterError::NotFound(path.to_string())),
        };

        if method != allowed {
            return Err(RouterError::MethodNotAllowed {
                path: path.to_string(),
                allowed,
            });
        }

        Ok(route)
    }
}
