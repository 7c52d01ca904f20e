//! Media Upload Gateway Library
//!
//! Thin HTTP gateway that accepts image and video uploads and forwards them
//! to a Cloudinary-style media-hosting provider, returning the provider's
//! secure URL.
//!
//! # Features
//!
//! - **Upload Only**: Two endpoints, `/api/upload/image` and `/api/upload/video`
//! - **Provider Delegation**: Transformation, storage and CDN delivery are the
//!   provider's job; the gateway only validates, streams and maps responses
//! - **Testable Seam**: The provider is a trait, so handlers can be exercised
//!   against mocks without any network
//!
//! # Example
//!
//! ```no_run
//! use media_upload_gateway::{config::Config, server::Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let server = Server::new(config)?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod metrics;
pub mod provider;
pub mod router;
pub mod server;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use server::Server;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
