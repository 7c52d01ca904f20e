//! Inbound multipart parsing
//!
//! Extracts the `file` field from a `multipart/form-data` request body into
//! an [`UploadRequest`], enforcing the configured size cap while streaming.
//! The stream is fully consumed on every path so the connection stays usable.

use super::UploadRequest;
use bytes::{BufMut, Bytes, BytesMut};
use futures::Stream;
use thiserror::Error;

/// Form field carrying the uploaded file
pub const FILE_FIELD: &str = "file";

/// File name used when the client omits one in the Content-Disposition
const DEFAULT_FILE_NAME: &str = "upload.bin";

/// Multipart parsing errors
#[derive(Error, Debug)]
pub enum MultipartError {
    #[error("Missing or invalid multipart boundary in Content-Type")]
    MissingBoundary,

    #[error("No file field in request body")]
    MissingFile,

    #[error("Malformed multipart body: {0}")]
    Malformed(String),

    #[error("Upload exceeds the configured limit of {limit} bytes")]
    TooLarge { limit: usize },
}

/// Extract the uploaded file from a multipart body stream.
///
/// Returns the first `file` field found. Other fields are drained and
/// ignored. A present-but-empty file is returned as an empty
/// [`UploadRequest`]; rejecting it is the gateway's decision, not a parse
/// error.
pub async fn extract_file<S, E>(
    stream: S,
    content_type: &str,
    max_bytes: usize,
) -> Result<UploadRequest, MultipartError>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let boundary =
        multer::parse_boundary(content_type).map_err(|_| MultipartError::MissingBoundary)?;
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| MultipartError::Malformed(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            // Drain unrelated fields so parsing can continue
            while field
                .chunk()
                .await
                .map_err(|e| MultipartError::Malformed(e.to_string()))?
                .is_some()
            {}
            continue;
        }

        let file_name = field.file_name().unwrap_or(DEFAULT_FILE_NAME).to_string();
        let mut body = BytesMut::new();

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| MultipartError::Malformed(e.to_string()))?
        {
            if body.len() + chunk.len() > max_bytes {
                return Err(MultipartError::TooLarge { limit: max_bytes });
            }
            body.put(chunk);
        }

        return Ok(UploadRequest::new(file_name, body.freeze()));
    }

    Err(MultipartError::MissingFile)
}
