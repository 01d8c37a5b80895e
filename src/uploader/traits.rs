use async_trait::async_trait;
use bytes::Bytes;

use crate::engine::progress::ProgressSink;
use crate::engine::request::UploadRequest;
use crate::error::UploadError;

/// What the endpoint answered. The body is kept opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Network backend performing one multipart POST per request.
///
/// Implementations return `Ok` whenever the endpoint answered, whatever the
/// status; only connection-level failures are errors. Dropping the future
/// must cancel the request.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(
        &self,
        request: &UploadRequest,
        progress: ProgressSink,
    ) -> Result<TransportResponse, UploadError>;
}
